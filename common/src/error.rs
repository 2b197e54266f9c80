//! # Error Types
//!
//! Each layer gets its own enum so callers can tell a broken record apart
//! from a broken run:
//!
//! * [`RecordError`]: a single malformed dataset line. Skipped.
//! * [`DatasetError`]: the dataset stream itself could not be read.
//! * [`CheckError`]: one check failed. Rendered, never fatal.
//! * [`SetupError`]: the run cannot start. Fatal.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("expected 5 tab separated fields, found {0}")]
    FieldCount(usize),
    #[error("invalid address '{0}'")]
    Address(String),
    #[error("first address {first} is above last address {last}")]
    InvertedRange { first: String, last: String },
    #[error("invalid AS number '{0}'")]
    AsNumber(String),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("opening {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("reading line {line}: {source}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error("fetching {name}: {reason}")]
    Fetch { name: String, reason: String },
    #[error("lookup failed: {0}")]
    Lookup(String),
    #[error("probe failed: {0}")]
    Probe(String),
    #[error("check aborted: {0}")]
    Aborted(String),
    #[error("rendering structured output: {0}")]
    Structured(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("unknown check '{id}', available: {available}")]
    UnknownCheck { id: String, available: String },
    #[error("no checks selected")]
    NoChecks,
    #[error("invalid target '{0}'")]
    InvalidTarget(String),
    #[error("could not resolve '{host}': {reason}")]
    Unresolvable { host: String, reason: String },
    #[error("building HTTP client: {0}")]
    HttpClient(String),
}
