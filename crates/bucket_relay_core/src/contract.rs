use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::object_keys::decode_object_key;

pub const COMPLETION_MESSAGE: &str = "Data copied successfully";
pub const QUEUE_EVENT_SOURCE: &str = "aws:sqs";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("queue event must include a Records array of messages: {0}")]
    InvalidBatch(String),
    #[error("queue message body is not a notification envelope: {0}")]
    InvalidNotification(String),
    #[error("object event is malformed: {0}")]
    InvalidObjectEvent(String),
    #[error("queue message body is not JSON: {0}")]
    InvalidMessageBody(String),
}

/// One message of a queue-triggered batch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueMessage {
    #[serde(rename = "messageId", default)]
    pub message_id: Option<String>,
    pub body: String,
    #[serde(rename = "receiptHandle")]
    pub receipt_handle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct QueueBatch {
    #[serde(rename = "Records")]
    records: Vec<QueueMessage>,
}

/// Outer notification carried in a queue message body. `Message` holds the
/// serialized object event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationEnvelope {
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "TopicArn", default, skip_serializing_if = "Option::is_none")]
    pub topic_arn: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectEvent {
    #[serde(rename = "Records")]
    pub records: Vec<ObjectEventRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectEventRecord {
    #[serde(rename = "eventName", default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    pub s3: S3Entity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Entity {
    pub bucket: S3Bucket,
    pub object: S3Object,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct S3Object {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequencer: Option<String>,
}

/// A decoded (bucket, key) pair with the key already percent-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
    pub sequencer: Option<String>,
}

impl ObjectEventRecord {
    pub fn location(&self) -> ObjectLocation {
        ObjectLocation {
            bucket: self.s3.bucket.name.clone(),
            key: decode_object_key(&self.s3.object.key),
            sequencer: self.s3.object.sequencer.clone(),
        }
    }
}

/// Body published to the logging queue after each successful copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionNotice {
    pub message: String,
    pub source_bucket: String,
    pub destination_bucket: String,
    pub key: String,
    pub size_bytes: u64,
    pub notice_id: String,
}

impl CompletionNotice {
    pub fn new(source: &ObjectLocation, destination_bucket: &str, size_bytes: u64) -> Self {
        Self {
            message: COMPLETION_MESSAGE.to_string(),
            source_bucket: source.bucket.clone(),
            destination_bucket: destination_bucket.to_string(),
            key: source.key.clone(),
            size_bytes,
            notice_id: notice_fingerprint(source),
        }
    }

    pub fn to_body(&self) -> String {
        stable_contract_json(self)
    }
}

/// Identifies one object-creation event so downstream consumers can drop
/// notices duplicated by redelivery.
pub fn notice_fingerprint(source: &ObjectLocation) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.bucket.as_bytes());
    hasher.update([0u8]);
    hasher.update(source.key.as_bytes());
    hasher.update([0u8]);
    hasher.update(source.sequencer.as_deref().unwrap_or_default().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn stable_contract_json(value: impl Serialize) -> String {
    serde_json::to_string(&value).expect("serialization of contract value should not fail")
}

/// True when every record of the invocation payload came from a queue.
pub fn is_queue_event(event: &Value) -> bool {
    event
        .get("Records")
        .and_then(Value::as_array)
        .map(|records| {
            !records.is_empty()
                && records.iter().all(|record| {
                    record
                        .get("eventSource")
                        .and_then(Value::as_str)
                        .map(|source| source == QUEUE_EVENT_SOURCE)
                        .unwrap_or(false)
                })
        })
        .unwrap_or(false)
}

pub fn decode_queue_batch(event: &Value) -> Result<Vec<QueueMessage>, EnvelopeError> {
    QueueBatch::deserialize(event)
        .map(|batch| batch.records)
        .map_err(|error| EnvelopeError::InvalidBatch(error.to_string()))
}

/// Unwraps both encoding layers of a queue message body.
pub fn decode_notification(body: &str) -> Result<ObjectEvent, EnvelopeError> {
    let envelope: NotificationEnvelope = serde_json::from_str(body)
        .map_err(|error| EnvelopeError::InvalidNotification(error.to_string()))?;
    serde_json::from_str(&envelope.message)
        .map_err(|error| EnvelopeError::InvalidObjectEvent(error.to_string()))
        .and_then(require_records)
}

/// Decodes an object event delivered straight to the function.
pub fn decode_object_event(event: &Value) -> Result<ObjectEvent, EnvelopeError> {
    ObjectEvent::deserialize(event)
        .map_err(|error| EnvelopeError::InvalidObjectEvent(error.to_string()))
        .and_then(require_records)
}

fn require_records(event: ObjectEvent) -> Result<ObjectEvent, EnvelopeError> {
    if event.records.is_empty() {
        return Err(EnvelopeError::InvalidObjectEvent(
            "Records array is empty".to_string(),
        ));
    }
    Ok(event)
}
