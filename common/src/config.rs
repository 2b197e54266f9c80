use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use tracing::debug;

use crate::error::ConfigError;

/// Name of the optional secrets file inside the config directory.
pub const CONFIG_FILE: &str = "checkip.env";

/// Cached datasets older than this are downloaded again.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// One aligned `name: summary` line per check.
    #[default]
    Text,
    /// One JSON document per check.
    Json,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Where downloaded datasets are kept between runs.
    pub cache_dir: PathBuf,
    /// How long a cached dataset is trusted.
    pub max_age: Duration,
    pub format: OutputFormat,
    /// Suppresses headers, spinner and the closing summary.
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            max_age: DEFAULT_MAX_AGE,
            format: OutputFormat::default(),
            quiet: false,
        }
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "checkip")
}

pub fn default_cache_dir() -> PathBuf {
    project_directory()
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| env::temp_dir().join("checkip"))
}

pub fn config_file() -> Option<PathBuf> {
    project_directory().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Looks up a configuration value such as a license key.
///
/// The environment wins. Otherwise `KEY=value` lines in [`config_file`] are
/// searched. Returns `Ok(None)` when the key is set nowhere.
pub fn get_value(key: &str) -> Result<Option<String>, ConfigError> {
    if let Ok(value) = env::var(key) {
        if !value.is_empty() {
            return Ok(Some(value));
        }
    }

    match config_file() {
        Some(path) => get_value_from(&path, key),
        None => Ok(None),
    }
}

/// Reads `key` from a dotenv style file. A missing file is not an error.
pub fn get_value_from(path: &Path, key: &str) -> Result<Option<String>, ConfigError> {
    if !path.exists() {
        debug!("no config file at {}", path.display());
        return Ok(None);
    }

    let to_config_error = |source| ConfigError::File {
        path: path.to_path_buf(),
        source,
    };

    for item in dotenvy::from_path_iter(path).map_err(to_config_error)? {
        let (name, value) = item.map_err(to_config_error)?;
        if name == key && !value.is_empty() {
            return Ok(Some(value));
        }
    }
    Ok(None)
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
