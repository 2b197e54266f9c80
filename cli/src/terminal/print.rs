use checkip_common::check::Kind;
use checkip_common::check::render::{NAME_WIDTH, RenderedOutput};
use checkip_common::config::OutputFormat;
use colored::*;

use crate::terminal::{colors, spinner};

pub const TOTAL_WIDTH: usize = 64;

/// Writes one line of program output to stdout, around the spinner.
pub fn print(msg: &str) {
    spinner::suspend(|| println!("{msg}"));
}

pub fn header(msg: &str, quiet: bool) {
    if quiet {
        return;
    }

    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = console::measure_text_width(&formatted);

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: String = format!(
        "{}{}{}",
        "─".repeat(left).color(colors::SEPARATOR),
        formatted.to_uppercase().color(colors::PRIMARY),
        "─".repeat(right).color(colors::SEPARATOR)
    );

    print(&line);
}

pub fn fat_separator() {
    let sep: ColoredString = "═".repeat(TOTAL_WIDTH).color(colors::SEPARATOR);
    print(&format!("{}", sep));
}

pub fn centerln(msg: &str) {
    let space = " ".repeat(TOTAL_WIDTH.saturating_sub(console::measure_text_width(msg)) / 2);
    print(&format!("{}{}", space, msg));
}

/// Emits a check's output. JSON documents are printed untouched.
pub fn check_output(output: &RenderedOutput) {
    match output.format {
        OutputFormat::Json => print(&output.to_string()),
        OutputFormat::Text => print(&colorize(output)),
    }
}

fn colorize(output: &RenderedOutput) -> String {
    let name = format!("{:<width$}", output.name, width = NAME_WIDTH);
    let body = if output.failed {
        output.body.color(colors::FAILURE)
    } else {
        match output.kind {
            Kind::Info => output.body.color(colors::TEXT_DEFAULT),
            Kind::Warning => output.body.color(colors::WARNING),
            Kind::Error => output.body.color(colors::FAILURE),
        }
    };
    format!("{} {}", name.color(colors::ACCENT), body)
}

pub fn list_entry(id: &str, name: &str) {
    let id = format!("{:<8}", id);
    print(&format!("{} {}", id.color(colors::PRIMARY), name.color(colors::TEXT_DEFAULT)));
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_keeps_column_width() {
        colored::control::set_override(false);
        let output = RenderedOutput {
            name: "ping".into(),
            kind: Kind::Info,
            body: "0% packet loss".into(),
            failed: false,
            format: OutputFormat::Text,
        };
        assert_eq!(colorize(&output), output.to_string());
        assert_eq!(colorize(&output), "ping            0% packet loss");
    }
}
