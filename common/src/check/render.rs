//! Turns a [`CheckResult`] into the text that is emitted for it.

use std::fmt;

use serde::Serialize;

use super::{CheckResult, Kind, NOT_AVAILABLE};
use crate::config::OutputFormat;
use crate::error::CheckError;

/// Width of the name column in text output.
pub const NAME_WIDTH: usize = 15;

/// One check's complete contribution to the program output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedOutput {
    pub name: String,
    pub kind: Kind,
    /// Summary line, error text or JSON document, depending on the format.
    pub body: String,
    pub failed: bool,
    pub format: OutputFormat,
}

impl fmt::Display for RenderedOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format {
            OutputFormat::Text => write!(f, "{:<width$} {}", self.name, self.body, width = NAME_WIDTH),
            OutputFormat::Json => write!(f, "{}", self.body),
        }
    }
}

#[derive(Serialize)]
struct Document<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: Kind,
    #[serde(skip_serializing_if = "Option::is_none")]
    info: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn render(result: &CheckResult, format: OutputFormat) -> RenderedOutput {
    let (body, failed) = match format {
        OutputFormat::Text => render_text(result),
        OutputFormat::Json => render_json(result),
    };

    RenderedOutput {
        name: result.name.clone(),
        kind: result.kind,
        body,
        failed,
        format,
    }
}

fn render_text(result: &CheckResult) -> (String, bool) {
    if let Some(error) = &result.error {
        return (error.to_string(), true);
    }
    match &result.info {
        Some(info) => (info.summary(), false),
        None => (NOT_AVAILABLE.to_string(), false),
    }
}

fn render_json(result: &CheckResult) -> (String, bool) {
    let mut failed = result.error.is_some();
    let mut error = result.error.as_ref().map(|e| e.to_string());

    let info = match (&result.info, &error) {
        (Some(info), None) => match info.as_structured() {
            Ok(value) => Some(value),
            Err(e) => {
                failed = true;
                error = Some(CheckError::Structured(e).to_string());
                None
            }
        },
        _ => None,
    };

    let document = Document {
        name: &result.name,
        kind: result.kind,
        info,
        error,
    };

    match serde_json::to_string(&document) {
        Ok(body) => (body, failed),
        Err(e) => (
            serde_json::json!({ "name": result.name, "error": e.to_string() }).to_string(),
            true,
        ),
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
