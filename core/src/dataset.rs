//! # Dataset Cache
//!
//! Checks that read large third party datasets share one [`Fetcher`]. A
//! dataset is downloaded into the cache directory when it is missing or older
//! than the configured age, and reused otherwise.
//!
//! Downloads are decompressed into a temporary file next to the destination
//! and renamed over it in one step. Several `checkip` processes may refresh
//! the same file at once: each writes its own temporary file, readers only
//! ever see a complete dataset, and the last rename wins.

use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use checkip_common::config::Config;
use checkip_common::error::{CheckError, SetupError};
use flate2::read::GzDecoder;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    Plain,
    /// A single gzip compressed file.
    Gz,
    /// A gzip compressed tar archive; the entry with the dataset's file name
    /// is extracted.
    Tgz,
}

/// Where a dataset comes from and what it is called on disk.
#[derive(Clone, Debug)]
pub struct Dataset {
    pub file_name: &'static str,
    pub url: String,
    pub compression: Compression,
}

impl Dataset {
    pub fn new(file_name: &'static str, url: impl Into<String>, compression: Compression) -> Self {
        Self {
            file_name,
            url: url.into(),
            compression,
        }
    }
}

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Whole request budget, body included. GeoLite2 City is tens of megabytes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub struct Fetcher {
    cache_dir: PathBuf,
    max_age: Duration,
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(cache_dir: impl Into<PathBuf>, max_age: Duration) -> Result<Self, SetupError> {
        Self::with_timeouts(cache_dir, max_age, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    pub fn with_timeouts(
        cache_dir: impl Into<PathBuf>,
        max_age: Duration,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, SetupError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| SetupError::HttpClient(e.to_string()))?;

        Ok(Self {
            cache_dir: cache_dir.into(),
            max_age,
            client,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, SetupError> {
        Self::new(&cfg.cache_dir, cfg.max_age)
    }

    pub fn path_for(&self, dataset: &Dataset) -> PathBuf {
        self.cache_dir.join(dataset.file_name)
    }

    /// Returns the path of an up to date copy of `dataset`, downloading it
    /// first if needed. A stale copy is still used when the refresh fails.
    pub async fn ensure(&self, dataset: &Dataset) -> Result<PathBuf, CheckError> {
        let path = self.path_for(dataset);

        if is_fresh(&path, self.max_age) {
            debug!("reusing cached {}", path.display());
            return Ok(path);
        }

        match self.download(dataset, &path).await {
            Ok(()) => Ok(path),
            Err(e) if path.exists() => {
                warn!("Could not refresh {}, using stale copy: {e}", dataset.file_name);
                Ok(path)
            }
            Err(e) => Err(e),
        }
    }

    async fn download(&self, dataset: &Dataset, dest: &Path) -> Result<(), CheckError> {
        let name = dataset.file_name;
        info!("Downloading {name}");

        // Dataset URLs can carry license keys, so errors are reported without them.
        let to_fetch_error = |e: reqwest::Error| fetch_error(name, e.without_url());

        let bytes = self
            .client
            .get(&dataset.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(to_fetch_error)?
            .bytes()
            .await
            .map_err(to_fetch_error)?;

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|e| fetch_error(name, e))?;

        let size = bytes.len();
        let dir = self.cache_dir.clone();
        let dest = dest.to_path_buf();
        let compression = dataset.compression;

        tokio::task::spawn_blocking(move || install(&bytes, compression, name, &dir, &dest))
            .await
            .map_err(|e| CheckError::Aborted(e.to_string()))?
            .map_err(|e| fetch_error(name, e))?;

        debug!(size, "installed {name}");
        Ok(())
    }
}

fn fetch_error(name: &str, reason: impl ToString) -> CheckError {
    CheckError::Fetch {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Whether `path` exists and was modified less than `max_age` ago.
pub fn is_fresh(path: &Path, max_age: Duration) -> bool {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age < max_age)
}

/// Decompresses `bytes` into a temporary file in `dir` and atomically moves
/// it to `dest`.
pub fn install(
    bytes: &[u8],
    compression: Compression,
    file_name: &str,
    dir: &Path,
    dest: &Path,
) -> io::Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;

    match compression {
        Compression::Plain => tmp.write_all(bytes)?,
        Compression::Gz => {
            io::copy(&mut GzDecoder::new(bytes), &mut tmp)?;
        }
        Compression::Tgz => extract_entry(bytes, file_name, &mut tmp)?,
    }

    tmp.as_file().sync_all()?;
    tmp.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

fn extract_entry<W: Write>(bytes: &[u8], file_name: &str, out: &mut W) -> io::Result<()> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));

    for entry in archive.entries()? {
        let mut entry = entry?;
        let is_wanted = entry.path()?.file_name() == Some(OsStr::new(file_name));
        if is_wanted {
            io::copy(&mut entry, out)?;
            return Ok(());
        }
    }

    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{file_name} not found in archive"),
    ))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
