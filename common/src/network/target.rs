//! # Check Target Model
//!
//! The address every check of a run is pointed at. A target can be given as:
//! * A literal IPv4/IPv6 address (e.g., `1.1.1.1`, `2606:4700::1111`).
//! * A hostname (e.g., `one.one.one.one`), resolved once before dispatch.

use std::net::IpAddr;
use std::str::FromStr;

use tracing::{debug, info};

use crate::error::SetupError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// A literal address, used as-is.
    Addr { addr: IpAddr },
    /// A name to resolve through the system resolver.
    Host { name: String },
}

impl FromStr for Target {
    type Err = SetupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(target) = parse_addr(s) {
            return Ok(target);
        }

        if let Some(target) = parse_hostname(s) {
            return Ok(target);
        }

        Err(SetupError::InvalidTarget(s.to_string()))
    }
}

impl Target {
    /// Resolves the target to the single address the checks will run against.
    ///
    /// Hostnames take the first address the resolver returns.
    pub async fn resolve(&self) -> Result<IpAddr, SetupError> {
        match self {
            Target::Addr { addr } => Ok(*addr),
            Target::Host { name } => {
                let mut addrs = tokio::net::lookup_host((name.as_str(), 0))
                    .await
                    .map_err(|e| SetupError::Unresolvable {
                        host: name.clone(),
                        reason: e.to_string(),
                    })?;

                let addr = addrs.next().map(|sa| sa.ip()).ok_or_else(|| SetupError::Unresolvable {
                    host: name.clone(),
                    reason: "no addresses returned".to_string(),
                })?;

                info!("Resolved {name} to {addr}");
                Ok(addr)
            }
        }
    }
}

/// Parses a literal address. Brackets around IPv6 literals are accepted.
fn parse_addr(s: &str) -> Option<Target> {
    let unbracketed = s
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .unwrap_or(s);

    unbracketed
        .parse::<IpAddr>()
        .ok()
        .map(|addr| Target::Addr { addr })
}

/// Accepts RFC 1123 style hostnames: dot separated labels of letters, digits
/// and hyphens, each 1 to 63 characters and not starting or ending with '-'.
fn parse_hostname(s: &str) -> Option<Target> {
    let name = s.strip_suffix('.').unwrap_or(s);
    if name.is_empty() || name.len() > 253 {
        return None;
    }

    // All-numeric names look like mistyped addresses ("1.2.3.256").
    if name.split('.').all(|label| label.chars().all(|c| c.is_ascii_digit())) {
        debug!("rejecting numeric hostname {name}");
        return None;
    }

    let valid = name.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });

    valid.then(|| Target::Host {
        name: name.to_ascii_lowercase(),
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
