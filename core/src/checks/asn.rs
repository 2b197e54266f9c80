//! Autonomous system lookup against the iptoasn.com dataset.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use checkip_common::check::{Check, Info, na};
use checkip_common::error::CheckError;
use checkip_common::network::range::{self, NetworkRange};
use serde::{Deserialize, Serialize};

use crate::dataset::{Compression, Dataset, Fetcher};

pub const DATASET_FILE: &str = "ip2asn-combined.tsv";
pub const DATASET_URL: &str = "https://iptoasn.com/data/ip2asn-combined.tsv.gz";

/// The network block owning an address. Only the description is part of the
/// structured output.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutonomousSystem {
    #[serde(skip)]
    pub number: u32,
    #[serde(skip)]
    pub first: Option<IpAddr>,
    #[serde(skip)]
    pub last: Option<IpAddr>,
    pub description: String,
    #[serde(skip)]
    pub country_code: String,
}

impl From<NetworkRange> for AutonomousSystem {
    fn from(range: NetworkRange) -> Self {
        Self {
            number: range.as_number,
            first: Some(range.first),
            last: Some(range.last),
            description: range.description,
            country_code: range.country_code,
        }
    }
}

impl Info for AutonomousSystem {
    fn summary(&self) -> String {
        format!("AS description: {}", na(&self.description))
    }

    fn as_structured(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

pub struct IpToAsn {
    fetcher: Arc<Fetcher>,
    dataset: Dataset,
}

impl IpToAsn {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self {
            fetcher,
            dataset: Dataset::new(DATASET_FILE, DATASET_URL, Compression::Gz),
        }
    }
}

#[async_trait]
impl Check for IpToAsn {
    fn id(&self) -> &'static str {
        "asn"
    }

    fn name(&self) -> &'static str {
        "iptoasn.com"
    }

    async fn inspect(&self, target: IpAddr) -> Result<Option<Box<dyn Info>>, CheckError> {
        let path = self.fetcher.ensure(&self.dataset).await?;
        let found = search(target, path).await?;

        // An address outside every range still gets a (blank) record.
        let asn = found.map(AutonomousSystem::from).unwrap_or_default();
        Ok(Some(Box::new(asn)))
    }
}

/// Scans the dataset at `path` off the async runtime.
pub async fn search(target: IpAddr, path: PathBuf) -> Result<Option<NetworkRange>, CheckError> {
    let found = tokio::task::spawn_blocking(move || range::lookup_file(&target, &path))
        .await
        .map_err(|e| CheckError::Aborted(e.to_string()))??;
    Ok(found)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
