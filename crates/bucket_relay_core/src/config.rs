//! Handler configuration read from the function environment.
//!
//! Each handler gets its own struct so a missing variable fails the
//! invocation before any outbound call. `from_lookup` takes any variable
//! source, which keeps tests off the process environment.

pub const DESTINATION_BUCKET_VAR: &str = "DESTINATION_BUCKET";
pub const LOGGER_QUEUE_URL_VAR: &str = "LOGGER_QUEUE_URL";
pub const COPIER_QUEUE_URL_VAR: &str = "COPIER_QUEUE_URL";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopierConfig {
    pub destination_bucket: String,
    pub logger_queue_url: String,
    pub copier_queue_url: String,
}

impl CopierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            destination_bucket: required(&lookup, DESTINATION_BUCKET_VAR)?,
            logger_queue_url: required(&lookup, LOGGER_QUEUE_URL_VAR)?,
            copier_queue_url: required(&lookup, COPIER_QUEUE_URL_VAR)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    pub destination_bucket: String,
    pub logger_queue_url: String,
}

impl LoggerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            destination_bucket: required(&lookup, DESTINATION_BUCKET_VAR)?,
            logger_queue_url: required(&lookup, LOGGER_QUEUE_URL_VAR)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanerConfig {
    pub destination_bucket: String,
}

impl CleanerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            destination_bucket: required(&lookup, DESTINATION_BUCKET_VAR)?,
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(name))
}
