use bucket_relay_core::config::CopierConfig;
use bucket_relay_core::contract::{
    decode_notification, decode_object_event, decode_queue_batch, is_queue_event,
    CompletionNotice, ObjectEventRecord,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::object_store::ObjectStore;
use crate::adapters::queue::MessageQueue;
use crate::handlers::HandlerError;

const COMPONENT: &str = "copier";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CopierSummary {
    pub status: String,
    pub objects_copied: usize,
    pub bytes_copied: u64,
    pub messages_acknowledged: usize,
}

/// Copies every object referenced by the invocation into the destination
/// bucket.
///
/// Queue batches are processed message by message: each record is copied and
/// announced on the logging queue, then the message is deleted from the
/// copier queue. A direct bucket notification is copied the same way but has
/// nothing to acknowledge. The first failure stops the invocation.
pub fn handle_copier_event(
    event: &Value,
    config: &CopierConfig,
    store: &impl ObjectStore,
    queue: &impl MessageQueue,
) -> Result<CopierSummary, HandlerError> {
    let result = if is_queue_event(event) {
        copy_queue_batch(event, config, store, queue)
    } else {
        copy_direct_event(event, config, store, queue)
    };

    if let Err(failure) = &result {
        error!(
            component = COMPONENT,
            event = "copy_failed",
            error_kind = failure.kind(),
            "Error copying object: {failure}"
        );
    }
    result
}

fn copy_queue_batch(
    event: &Value,
    config: &CopierConfig,
    store: &impl ObjectStore,
    queue: &impl MessageQueue,
) -> Result<CopierSummary, HandlerError> {
    let messages = decode_queue_batch(event)?;
    let mut summary = CopierSummary::default();

    for message in &messages {
        let object_event = decode_notification(&message.body)?;
        for record in &object_event.records {
            copy_record(record, config, store, queue, &mut summary)?;
        }

        queue
            .delete_message(&config.copier_queue_url, &message.receipt_handle)
            .map_err(|error| {
                HandlerError::queue("delete_message", &config.copier_queue_url, error)
            })?;
        summary.messages_acknowledged += 1;
    }

    summary.status = "ok".to_string();
    Ok(summary)
}

fn copy_direct_event(
    event: &Value,
    config: &CopierConfig,
    store: &impl ObjectStore,
    queue: &impl MessageQueue,
) -> Result<CopierSummary, HandlerError> {
    let object_event = decode_object_event(event)?;
    let mut summary = CopierSummary::default();
    for record in &object_event.records {
        copy_record(record, config, store, queue, &mut summary)?;
    }

    summary.status = "ok".to_string();
    Ok(summary)
}

fn copy_record(
    record: &ObjectEventRecord,
    config: &CopierConfig,
    store: &impl ObjectStore,
    queue: &impl MessageQueue,
    summary: &mut CopierSummary,
) -> Result<(), HandlerError> {
    let source = record.location();
    let destination_bucket = config.destination_bucket.as_str();

    let size_bytes = store
        .object_size(&source.bucket, &source.key)
        .map_err(|error| {
            HandlerError::storage("head_object", &source.bucket, &source.key, error)
        })?;

    store
        .copy_object(&source.bucket, &source.key, destination_bucket, &source.key)
        .map_err(|error| {
            HandlerError::storage("copy_object", destination_bucket, &source.key, error)
        })?;

    info!(
        component = COMPONENT,
        event = "object_copied",
        source_bucket = %source.bucket,
        destination_bucket,
        key = %source.key,
        size_bytes,
        "Successfully copied {} from {} to {} as {}. Size: {} bytes",
        source.key,
        source.bucket,
        destination_bucket,
        source.key,
        size_bytes
    );

    let notice = CompletionNotice::new(&source, destination_bucket, size_bytes);
    queue
        .send_message(&config.logger_queue_url, &notice.to_body())
        .map_err(|error| {
            HandlerError::queue("send_message", &config.logger_queue_url, error)
        })?;

    summary.objects_copied += 1;
    summary.bytes_copied = summary.bytes_copied.saturating_add(size_bytes);
    Ok(())
}
