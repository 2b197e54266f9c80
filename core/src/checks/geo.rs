//! Geolocation from MaxMind's GeoLite2 City database.
//!
//! The database needs a (free) license key. Without one the check reports
//! nothing rather than failing.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use checkip_common::check::{Check, Info, na};
use checkip_common::config;
use checkip_common::error::CheckError;
use maxminddb::{MaxMindDBError, Reader, geoip2};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::{Compression, Dataset, Fetcher};

pub const LICENSE_KEY: &str = "MAXMIND_LICENSE_KEY";
pub const DATABASE_FILE: &str = "GeoLite2-City.mmdb";

fn download_url(license_key: &str) -> String {
    format!(
        "https://download.maxmind.com/app/geoip_download?edition_id=GeoLite2-City&license_key={license_key}&suffix=tar.gz"
    )
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub city: String,
    pub country: String,
    pub iso_code: String,
    pub is_in_eu: bool,
}

impl Info for GeoLocation {
    fn summary(&self) -> String {
        format!(
            "country: {} ({}), city: {}, EU member: {}",
            na(&self.country),
            na(&self.iso_code),
            na(&self.city),
            self.is_in_eu
        )
    }

    fn as_structured(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl From<&geoip2::City<'_>> for GeoLocation {
    fn from(record: &geoip2::City<'_>) -> Self {
        let city = record.city.as_ref().and_then(|c| c.names.as_ref());
        let country = record.country.as_ref();

        Self {
            city: english(city),
            country: english(country.and_then(|c| c.names.as_ref())),
            iso_code: country.and_then(|c| c.iso_code).unwrap_or_default().to_string(),
            is_in_eu: country.and_then(|c| c.is_in_european_union).unwrap_or(false),
        }
    }
}

fn english(names: Option<&BTreeMap<&str, &str>>) -> String {
    names
        .and_then(|names| names.get("en"))
        .map(|name| name.to_string())
        .unwrap_or_default()
}

/// Where the license key comes from.
enum LicenseKey {
    /// Environment or config file, read on every run.
    Configured,
    Fixed(String),
}

pub struct MaxMind {
    fetcher: Arc<Fetcher>,
    license_key: LicenseKey,
}

impl MaxMind {
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self {
            fetcher,
            license_key: LicenseKey::Configured,
        }
    }

    pub fn with_license_key(fetcher: Arc<Fetcher>, license_key: impl Into<String>) -> Self {
        Self {
            fetcher,
            license_key: LicenseKey::Fixed(license_key.into()),
        }
    }

    fn license_key(&self) -> Result<Option<String>, CheckError> {
        let key = match &self.license_key {
            LicenseKey::Configured => config::get_value(LICENSE_KEY)?,
            LicenseKey::Fixed(key) => Some(key.clone()),
        };
        Ok(key.filter(|k| !k.trim().is_empty()))
    }
}

#[async_trait]
impl Check for MaxMind {
    fn id(&self) -> &'static str {
        "geo"
    }

    fn name(&self) -> &'static str {
        "maxmind.com"
    }

    async fn inspect(&self, target: IpAddr) -> Result<Option<Box<dyn Info>>, CheckError> {
        let Some(license_key) = self.license_key()? else {
            debug!("{LICENSE_KEY} not set, skipping geolocation");
            return Ok(None);
        };

        let dataset = Dataset::new(DATABASE_FILE, download_url(&license_key), Compression::Tgz);
        let path = self.fetcher.ensure(&dataset).await?;

        let location = locate_blocking(path, target).await?;
        Ok(Some(Box::new(location)))
    }
}

async fn locate_blocking(path: PathBuf, target: IpAddr) -> Result<GeoLocation, CheckError> {
    tokio::task::spawn_blocking(move || locate(&path, target))
        .await
        .map_err(|e| CheckError::Aborted(e.to_string()))?
}

/// Opens the database at `path` and looks `target` up. The reader is closed
/// when this returns, whichever way.
pub fn locate(path: &Path, target: IpAddr) -> Result<GeoLocation, CheckError> {
    let reader = Reader::open_readfile(path)
        .map_err(|e| CheckError::Lookup(format!("can't load DB file: {e}")))?;

    match reader.lookup::<geoip2::City>(target) {
        Ok(record) => Ok(GeoLocation::from(&record)),
        Err(MaxMindDBError::AddressNotFoundError(_)) => {
            debug!("{target} not in {}", path.display());
            Ok(GeoLocation::default())
        }
        Err(e) => Err(CheckError::Lookup(e.to_string())),
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
