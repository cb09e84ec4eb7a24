use bucket_relay_core::config::LoggerConfig;
use bucket_relay_core::contract::{decode_queue_batch, EnvelopeError, QueueMessage};
use bucket_relay_core::temp_scan::total_size_message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::object_store::{scan_bucket, ObjectStore};
use crate::adapters::queue::MessageQueue;
use crate::handlers::HandlerError;

const COMPONENT: &str = "logger";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

/// Logs each completion notice, reports the total size of temp objects in
/// the destination bucket and acknowledges every message of the batch.
pub fn handle_logger_event(
    event: &Value,
    config: &LoggerConfig,
    store: &impl ObjectStore,
    queue: &impl MessageQueue,
) -> Result<LoggerResponse, HandlerError> {
    let result = report_temp_total(event, config, store, queue);
    if let Err(failure) = &result {
        error!(
            component = COMPONENT,
            event = "report_failed",
            error_kind = failure.kind(),
            "Error calculating total size: {failure}"
        );
    }
    result
}

fn report_temp_total(
    event: &Value,
    config: &LoggerConfig,
    store: &impl ObjectStore,
    queue: &impl MessageQueue,
) -> Result<LoggerResponse, HandlerError> {
    let messages = decode_queue_batch(event)?;
    for message in &messages {
        log_notice(message)?;
    }

    let bucket = config.destination_bucket.as_str();
    let (scan, pages) = scan_bucket(store, bucket).map_err(|error| HandlerError::Listing {
        bucket: bucket.to_string(),
        message: error,
    })?;

    let total_bytes = scan.total_temp_bytes();
    info!(
        component = COMPONENT,
        event = "temp_total_computed",
        bucket,
        total_bytes,
        temp_objects = scan.temp_objects(),
        objects_seen = scan.objects_seen(),
        pages,
        "temp object scan finished"
    );

    // Parsed by the file-size metric filter: `Total ... <n> bytes`, no fields.
    let report = total_size_message(bucket, total_bytes);
    info!("{report}");

    for message in &messages {
        queue
            .delete_message(&config.logger_queue_url, &message.receipt_handle)
            .map_err(|error| {
                HandlerError::queue("delete_message", &config.logger_queue_url, error)
            })?;
    }

    Ok(LoggerResponse {
        status_code: 200,
        body: report,
    })
}

fn log_notice(message: &QueueMessage) -> Result<(), HandlerError> {
    let payload: Value = serde_json::from_str(&message.body)
        .map_err(|error| EnvelopeError::InvalidMessageBody(error.to_string()))?;
    info!(
        component = COMPONENT,
        event = "notice_received",
        message_id = message.message_id.as_deref().unwrap_or_default(),
        "Received message: {payload}"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    use bucket_relay_core::contract::{CompletionNotice, ObjectLocation};
    use tracing_subscriber::EnvFilter;

    use super::*;
    use crate::telemetry::text_subscriber;
    use crate::test_helpers::{queue_event, InMemoryObjectStore, RecordingQueue};

    const LOGGER_QUEUE: &str = "https://sqs.local/logger";

    fn sample_config() -> LoggerConfig {
        LoggerConfig {
            destination_bucket: "dst".to_string(),
            logger_queue_url: LOGGER_QUEUE.to_string(),
        }
    }

    fn notice_body(key: &str) -> String {
        let source = ObjectLocation {
            bucket: "src".to_string(),
            key: key.to_string(),
            sequencer: None,
        };
        CompletionNotice::new(&source, "dst", 1).to_body()
    }

    fn seeded_store(page_size: usize) -> InMemoryObjectStore {
        let store = InMemoryObjectStore::with_page_size(page_size);
        store.put_object("dst", "a-temp-1", &[0; 100], 1_000);
        store.put_object("dst", "b-temp-2", &[0; 200], 2_000);
        store.put_object("dst", "c-final", &[0; 50], 500);
        store
    }

    #[test]
    fn reports_total_of_temp_objects_only() {
        let store = seeded_store(1_000);
        let queue = RecordingQueue::new();
        let event = queue_event(&[("rh-1", notice_body("a-temp-1"))]);

        let response = handle_logger_event(&event, &sample_config(), &store, &queue)
            .expect("logger should succeed");

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "Total size of temp objects in dst: 300 bytes");
    }

    #[test]
    fn total_spans_listing_pages() {
        let store = seeded_store(1);
        let queue = RecordingQueue::new();
        let event = queue_event(&[("rh-1", notice_body("a-temp-1"))]);

        let response = handle_logger_event(&event, &sample_config(), &store, &queue)
            .expect("logger should succeed");

        assert_eq!(response.body, "Total size of temp objects in dst: 300 bytes");
        let listings = store
            .calls()
            .into_iter()
            .filter(|call| call.starts_with("list_objects_v2"))
            .count();
        assert_eq!(listings, 3);
    }

    #[test]
    fn acknowledges_every_message_in_the_batch() {
        let store = seeded_store(1_000);
        let queue = RecordingQueue::new();
        let event = queue_event(&[
            ("rh-1", notice_body("a-temp-1")),
            ("rh-2", notice_body("b-temp-2")),
            ("rh-3", notice_body("c-final")),
        ]);

        handle_logger_event(&event, &sample_config(), &store, &queue)
            .expect("logger should succeed");

        assert_eq!(
            queue.deleted(),
            vec![
                (LOGGER_QUEUE.to_string(), "rh-1".to_string()),
                (LOGGER_QUEUE.to_string(), "rh-2".to_string()),
                (LOGGER_QUEUE.to_string(), "rh-3".to_string()),
            ]
        );
    }

    #[test]
    fn empty_bucket_reports_zero() {
        let store = InMemoryObjectStore::new();
        let queue = RecordingQueue::new();
        let event = queue_event(&[("rh-1", notice_body("x"))]);

        let response = handle_logger_event(&event, &sample_config(), &store, &queue)
            .expect("logger should succeed");

        assert_eq!(response.body, "Total size of temp objects in dst: 0 bytes");
    }

    #[test]
    fn non_json_body_fails_before_listing() {
        let store = seeded_store(1_000);
        let queue = RecordingQueue::new();
        let event = queue_event(&[("rh-1", "not json".to_string())]);

        let error = handle_logger_event(&event, &sample_config(), &store, &queue)
            .expect_err("non-json body should fail");

        assert!(matches!(
            error,
            HandlerError::Envelope(EnvelopeError::InvalidMessageBody(_))
        ));
        assert!(store.calls().is_empty());
        assert!(queue.deleted().is_empty());
    }

    #[test]
    fn listing_failure_leaves_messages_unacknowledged() {
        let store = seeded_store(1_000);
        store.fail_operation("list_objects_v2");
        let queue = RecordingQueue::new();
        let event = queue_event(&[("rh-1", notice_body("a-temp-1"))]);

        let error = handle_logger_event(&event, &sample_config(), &store, &queue)
            .expect_err("listing failure should propagate");

        assert!(matches!(error, HandlerError::Listing { .. }));
        assert!(queue.deleted().is_empty());
    }

    #[derive(Clone, Default)]
    struct CapturedLines(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLines {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("poisoned mutex").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLines {
        fn lines(&self) -> Vec<String> {
            let bytes = self.0.lock().expect("poisoned mutex").clone();
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    #[test]
    fn total_line_is_emitted_bare_for_metric_filter() {
        let store = seeded_store(1_000);
        let queue = RecordingQueue::new();
        let event = queue_event(&[("rh-1", notice_body("a-temp-1"))]);
        let captured = CapturedLines::default();
        let writer = captured.clone();
        let subscriber = text_subscriber(EnvFilter::new("info"), move || writer.clone());

        tracing::subscriber::with_default(subscriber, || {
            handle_logger_event(&event, &sample_config(), &store, &queue)
                .expect("logger should succeed");
        });

        let lines = captured.lines();
        let total_line = lines
            .iter()
            .find(|line| line.contains("Total size of temp objects"))
            .expect("total line should be logged");
        assert!(total_line.starts_with("Total size of temp objects in dst:"));
        let tokens: Vec<&str> = total_line.split_whitespace().collect();
        assert_eq!(tokens.first(), Some(&"Total"));
        assert_eq!(tokens.last(), Some(&"bytes"));
        assert_eq!(tokens[tokens.len() - 2], "300");
    }

    #[test]
    fn response_serializes_with_status_code_field() {
        let response = LoggerResponse {
            status_code: 200,
            body: "Total size of temp objects in dst: 0 bytes".to_string(),
        };
        let value = serde_json::to_value(&response).expect("response should serialize");
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"], "Total size of temp objects in dst: 0 bytes");
    }
}
