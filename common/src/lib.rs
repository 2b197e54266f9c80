//! # checkip common
//!
//! Types shared by every crate in the workspace:
//!
//! * **[`check`]**: the contract a check implements, the result it produces and
//!   how results are rendered.
//! * **[`network`]**: the range dataset lookup and target parsing.
//! * **[`config`]**: runtime settings and secret lookup.
//! * **[`error`]**: error types for each layer.

pub mod check;
pub mod config;
pub mod error;
pub mod network;
