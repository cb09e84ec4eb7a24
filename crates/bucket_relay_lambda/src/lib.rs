//! AWS-oriented adapters and handlers for the bucket relay functions.
//!
//! This crate owns runtime integration details (Lambda handlers, queue
//! acknowledgment and storage adapters). Envelope contracts, configuration
//! and the temp-object scan come from `bucket_relay_core`.

pub mod adapters;
pub mod handlers;
pub mod telemetry;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
