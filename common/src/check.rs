//! The **contract** every check implements to take part in a run.
//!
//! A check is a named, independent probe of a single address. It may read
//! files, open databases or send packets, but it must terminate on its own
//! and must not share mutable state with other checks. The orchestrator only
//! ever sees the [`CheckResult`] a check produces.

use std::fmt;
use std::net::IpAddr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

pub mod registry;
pub mod render;

/// Marker printed in place of a value a check could not determine.
pub const NOT_AVAILABLE: &str = "n/a";

/// Returns `s`, or [`NOT_AVAILABLE`] when it is empty.
pub fn na(s: &str) -> &str {
    if s.is_empty() { NOT_AVAILABLE } else { s }
}

/// How the output of a check should be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    #[default]
    Info,
    Warning,
    Error,
}

/// The capability set every piece of check output supports.
pub trait Info: fmt::Debug + Send + Sync {
    /// A single human readable line. Missing values are shown as
    /// [`NOT_AVAILABLE`], never dropped.
    fn summary(&self) -> String;

    /// The same data as a JSON value.
    fn as_structured(&self) -> Result<serde_json::Value, serde_json::Error>;
}

#[async_trait]
pub trait Check: Send + Sync {
    /// Short identifier used to select the check (e.g. `asn`).
    fn id(&self) -> &'static str;

    /// Name shown next to the output (e.g. `iptoasn.com`).
    fn name(&self) -> &'static str;

    fn kind(&self) -> Kind {
        Kind::Info
    }

    /// Inspects `target`. `Ok(None)` means the check ran but has nothing to
    /// report, e.g. because it is not configured.
    async fn inspect(&self, target: IpAddr) -> Result<Option<Box<dyn Info>>, CheckError>;
}

/// Everything one check invocation produced.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub kind: Kind,
    pub info: Option<Box<dyn Info>>,
    pub error: Option<CheckError>,
}

impl CheckResult {
    pub fn new(name: impl Into<String>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            info: None,
            error: None,
        }
    }

    pub fn with_info(mut self, info: Option<Box<dyn Info>>) -> Self {
        self.info = info;
        self
    }

    pub fn with_error(mut self, error: CheckError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }
}

/// Runs `check` against `target` and always returns a result. A failure is
/// attached to the result instead of being returned.
pub async fn execute(check: &dyn Check, target: IpAddr) -> CheckResult {
    let result = CheckResult::new(check.name(), check.kind());
    match check.inspect(target).await {
        Ok(info) => result.with_info(info),
        Err(e) => result.with_error(e),
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
