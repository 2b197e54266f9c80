use std::time::{Duration, Instant};

use checkip_common::check::render::render;
use checkip_common::config::Config;
use checkip_common::network::target::Target;
use checkip_core::{Orchestrator, RunSummary, checks};
use colored::*;
use tracing::info;

use crate::terminal::{colors, print, spinner};

pub async fn check(target: &Target, ids: &[String], cfg: &Config) -> anyhow::Result<RunSummary> {
    let registry = checks::builtin(cfg)?;
    let orchestrator = Orchestrator::from_registry(&registry, ids)?;
    let addr = target.resolve().await?;

    print::header(&format!("checking {addr}"), cfg.quiet);
    info!("Running {} checks against {addr}", orchestrator.len());

    let total = orchestrator.len();
    spinner::start(total, cfg.quiet);
    let start_time = Instant::now();

    let mut done = 0;
    let summary = orchestrator
        .run(addr, |result| {
            print::check_output(&render(&result, cfg.format));
            done += 1;
            spinner::report_progress(done, total);
        })
        .await;

    spinner::finish();
    print_summary(&summary, start_time.elapsed(), cfg);
    Ok(summary)
}

fn print_summary(summary: &RunSummary, total_time: Duration, cfg: &Config) {
    if cfg.quiet {
        return;
    }

    let succeeded: ColoredString = format!("{} ok", summary.succeeded).bold().green();
    let failed: ColoredString = if summary.failed > 0 {
        format!("{} failed", summary.failed).bold().red()
    } else {
        format!("{} failed", summary.failed).normal()
    };
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let output = format!("Checks complete: {succeeded}, {failed} in {total_time}")
        .color(colors::TEXT_DEFAULT)
        .to_string();

    print::fat_separator();
    print::centerln(&output);
}
