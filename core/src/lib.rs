//! # checkip core
//!
//! * **[`checks`]**: the built-in checks and the registry that lists them.
//! * **[`dataset`]**: download and on-disk caching of the datasets checks read.
//! * **[`orchestrator`]**: runs a selection of checks concurrently and collects
//!   one result per check.

pub mod checks;
pub mod dataset;
pub mod orchestrator;

pub use orchestrator::{Orchestrator, RunSummary};
