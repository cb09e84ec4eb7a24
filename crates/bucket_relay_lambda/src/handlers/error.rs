use bucket_relay_core::config::ConfigError;
use bucket_relay_core::contract::EnvelopeError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
    #[error("{operation} failed for s3://{bucket}/{key}: {message}")]
    Storage {
        operation: &'static str,
        bucket: String,
        key: String,
        message: String,
    },
    #[error("listing s3://{bucket} failed: {message}")]
    Listing { bucket: String, message: String },
    #[error("{operation} failed on queue {queue_url}: {message}")]
    Queue {
        operation: &'static str,
        queue_url: String,
        message: String,
    },
}

impl HandlerError {
    pub fn storage(operation: &'static str, bucket: &str, key: &str, message: String) -> Self {
        Self::Storage {
            operation,
            bucket: bucket.to_string(),
            key: key.to_string(),
            message,
        }
    }

    pub fn queue(operation: &'static str, queue_url: &str, message: String) -> Self {
        Self::Queue {
            operation,
            queue_url: queue_url.to_string(),
            message,
        }
    }

    /// Short machine-readable label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "configuration",
            Self::Envelope(_) => "malformed_event",
            Self::Storage { .. } | Self::Listing { .. } => "storage",
            Self::Queue { .. } => "queue",
        }
    }
}
