use std::sync::OnceLock;
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::terminal::colors;

static SPINNER: OnceLock<ProgressBar> = OnceLock::new();

fn style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ])
}

/// Starts the spinner on stderr. Quiet runs get a hidden one so the rest of
/// the code does not have to care.
pub fn start(total: usize, quiet: bool) {
    let pb = SPINNER.get_or_init(|| {
        if quiet {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        pb.set_style(style());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    });
    report_progress(0, total);
    pb.tick();
}

pub fn report_progress(done: usize, total: usize) {
    if let Some(pb) = SPINNER.get() {
        pb.set_message(
            format!(
                "Waiting for checks... {}",
                format!("{done}/{total}").green().bold()
            )
            .color(colors::TEXT_DEFAULT)
            .to_string(),
        );
    }
}

/// Runs `f` with the spinner cleared from the screen.
pub fn suspend<F: FnOnce() -> R, R>(f: F) -> R {
    match SPINNER.get() {
        Some(pb) => pb.suspend(f),
        None => f(),
    }
}

pub fn finish() {
    if let Some(pb) = SPINNER.get() {
        pb.finish_and_clear();
    }
}
