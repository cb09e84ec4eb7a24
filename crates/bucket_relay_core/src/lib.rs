//! Shared bucket relay domain primitives.
//!
//! This crate owns the trigger envelope contracts, handler configuration and
//! the temp-object scan used by the logger and cleaner. It intentionally
//! excludes AWS SDK and Lambda runtime concerns.

pub mod config;
pub mod contract;
pub mod object_keys;
pub mod temp_scan;
