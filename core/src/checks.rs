//! The checks shipped with checkip.
//!
//! [`builtin`] lists them in the order an unfiltered run dispatches them. A
//! new check only needs a [`Check`](checkip_common::check::Check)
//! implementation and an entry here.

use std::sync::Arc;

use checkip_common::check::registry::Registry;
use checkip_common::config::Config;
use checkip_common::error::SetupError;

use crate::dataset::Fetcher;

pub mod asn;
pub mod geo;
pub mod ping;

pub fn builtin(cfg: &Config) -> Result<Registry, SetupError> {
    let fetcher = Arc::new(Fetcher::from_config(cfg)?);

    Ok(Registry::new(vec![
        Arc::new(asn::IpToAsn::new(Arc::clone(&fetcher))),
        Arc::new(geo::MaxMind::new(fetcher)),
        Arc::new(ping::Ping::default()),
    ]))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
