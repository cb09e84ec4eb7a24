use bucket_relay_core::config::CleanerConfig;
use bucket_relay_core::contract::{decode_notification, decode_queue_batch, is_queue_event};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::adapters::object_store::{scan_bucket, ObjectStore};
use crate::handlers::HandlerError;

const COMPONENT: &str = "cleaner";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CleanerOutcome {
    pub status: String,
    pub temp_objects: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_key: Option<String>,
}

/// Deletes the oldest temp-marked object in the destination bucket.
///
/// The trigger only starts the scan: queue messages are decoded to reject
/// malformed envelopes, but their bucket and key are not used. At most one
/// object is deleted per invocation however many messages the batch holds.
pub fn handle_cleaner_event(
    event: &Value,
    config: &CleanerConfig,
    store: &impl ObjectStore,
) -> Result<CleanerOutcome, HandlerError> {
    let result = evict_oldest_temp_object(event, config, store);
    if let Err(failure) = &result {
        error!(
            component = COMPONENT,
            event = "clean_failed",
            error_kind = failure.kind(),
            "Error in cleaning temporary files: {failure}"
        );
    }
    result
}

fn evict_oldest_temp_object(
    event: &Value,
    config: &CleanerConfig,
    store: &impl ObjectStore,
) -> Result<CleanerOutcome, HandlerError> {
    if is_queue_event(event) {
        let messages = decode_queue_batch(event)?;
        for message in &messages {
            decode_notification(&message.body)?;
        }
        info!(
            component = COMPONENT,
            event = "triggered",
            messages = messages.len(),
            "cleaner triggered by queue batch"
        );
    } else {
        info!(
            component = COMPONENT,
            event = "triggered",
            "cleaner triggered by non-queue event"
        );
    }

    let bucket = config.destination_bucket.as_str();
    let (scan, pages) = scan_bucket(store, bucket).map_err(|error| HandlerError::Listing {
        bucket: bucket.to_string(),
        message: error,
    })?;

    let Some(oldest) = scan.oldest() else {
        info!(
            component = COMPONENT,
            event = "nothing_to_delete",
            bucket,
            objects_seen = scan.objects_seen(),
            pages,
            "No temporary files to delete."
        );
        return Ok(CleanerOutcome {
            status: "no_temp_objects".to_string(),
            temp_objects: 0,
            deleted_key: None,
        });
    };

    store
        .delete_object(bucket, &oldest.key)
        .map_err(|error| HandlerError::storage("delete_object", bucket, &oldest.key, error))?;

    info!(
        component = COMPONENT,
        event = "oldest_deleted",
        bucket,
        key = %oldest.key,
        last_modified = %oldest.last_modified.to_rfc3339(),
        size_bytes = oldest.size_bytes,
        temp_objects = scan.temp_objects(),
        "Successfully deleted oldest temporary file: {}",
        oldest.key
    );

    Ok(CleanerOutcome {
        status: "deleted".to_string(),
        temp_objects: scan.temp_objects(),
        deleted_key: Some(oldest.key.clone()),
    })
}

#[cfg(test)]
mod tests {
    use bucket_relay_core::contract::EnvelopeError;
    use serde_json::json;

    use super::*;
    use crate::test_helpers::{notification_body, queue_event, InMemoryObjectStore};

    fn sample_config() -> CleanerConfig {
        CleanerConfig {
            destination_bucket: "dst".to_string(),
        }
    }

    fn trigger() -> Value {
        queue_event(&[("rh-1", notification_body("src", "uploads/report.csv"))])
    }

    #[test]
    fn deletes_only_the_oldest_temp_object() {
        let store = InMemoryObjectStore::new();
        store.put_object("dst", "a-temp-1", &[0; 100], 1_000);
        store.put_object("dst", "b-temp-2", &[0; 200], 2_000);
        store.put_object("dst", "c-final", &[0; 50], 500);

        let outcome =
            handle_cleaner_event(&trigger(), &sample_config(), &store).expect("clean should pass");

        assert_eq!(outcome.deleted_key.as_deref(), Some("a-temp-1"));
        assert_eq!(outcome.temp_objects, 2);
        assert_eq!(
            store.keys("dst"),
            vec!["b-temp-2".to_string(), "c-final".to_string()]
        );
    }

    #[test]
    fn ties_delete_first_listed_object() {
        let store = InMemoryObjectStore::new();
        store.put_object("dst", "m-temp", &[0; 1], 1_000);
        store.put_object("dst", "z-temp", &[0; 1], 1_000);

        let outcome =
            handle_cleaner_event(&trigger(), &sample_config(), &store).expect("clean should pass");

        assert_eq!(outcome.deleted_key.as_deref(), Some("m-temp"));
        assert_eq!(store.keys("dst"), vec!["z-temp".to_string()]);
    }

    #[test]
    fn oldest_is_found_across_pages() {
        let store = InMemoryObjectStore::with_page_size(1);
        store.put_object("dst", "a-temp", &[0; 1], 3_000);
        store.put_object("dst", "b-temp", &[0; 1], 2_000);
        store.put_object("dst", "c-temp", &[0; 1], 1_000);

        let outcome =
            handle_cleaner_event(&trigger(), &sample_config(), &store).expect("clean should pass");

        assert_eq!(outcome.deleted_key.as_deref(), Some("c-temp"));
    }

    #[test]
    fn bucket_without_temp_objects_is_left_alone() {
        let store = InMemoryObjectStore::new();
        store.put_object("dst", "c-final", &[0; 50], 500);

        let outcome =
            handle_cleaner_event(&trigger(), &sample_config(), &store).expect("clean should pass");

        assert_eq!(outcome.status, "no_temp_objects");
        assert!(outcome.deleted_key.is_none());
        assert_eq!(store.keys("dst"), vec!["c-final".to_string()]);
        assert!(!store
            .calls()
            .iter()
            .any(|call| call.starts_with("delete_object")));
    }

    #[test]
    fn multi_message_batch_deletes_one_object() {
        let store = InMemoryObjectStore::new();
        store.put_object("dst", "a-temp-1", &[0; 100], 1_000);
        store.put_object("dst", "b-temp-2", &[0; 200], 2_000);
        let event = queue_event(&[
            ("rh-1", notification_body("src", "one")),
            ("rh-2", notification_body("src", "two")),
        ]);

        handle_cleaner_event(&event, &sample_config(), &store).expect("clean should pass");

        assert_eq!(store.keys("dst"), vec!["b-temp-2".to_string()]);
    }

    #[test]
    fn alarm_invocation_still_scans_bucket() {
        let store = InMemoryObjectStore::new();
        store.put_object("dst", "a-temp-1", &[0; 100], 1_000);
        let alarm = json!({
            "source": "aws.cloudwatch",
            "alarmData": {"alarmName": "FileSizeAlarm", "state": {"value": "ALARM"}}
        });

        let outcome =
            handle_cleaner_event(&alarm, &sample_config(), &store).expect("clean should pass");

        assert_eq!(outcome.deleted_key.as_deref(), Some("a-temp-1"));
    }

    #[test]
    fn malformed_envelope_fails_before_listing() {
        let store = InMemoryObjectStore::new();
        store.put_object("dst", "a-temp-1", &[0; 100], 1_000);
        let event = queue_event(&[("rh-1", "{}".to_string())]);

        let error =
            handle_cleaner_event(&event, &sample_config(), &store).expect_err("should fail");

        assert!(matches!(
            error,
            HandlerError::Envelope(EnvelopeError::InvalidNotification(_))
        ));
        assert!(store.calls().is_empty());
    }

    #[test]
    fn delete_failure_propagates() {
        let store = InMemoryObjectStore::new();
        store.put_object("dst", "a-temp-1", &[0; 100], 1_000);
        store.fail_operation("delete_object");

        let error =
            handle_cleaner_event(&trigger(), &sample_config(), &store).expect_err("should fail");

        assert!(matches!(
            error,
            HandlerError::Storage {
                operation: "delete_object",
                ..
            }
        ));
        assert_eq!(store.keys("dst"), vec!["a-temp-1".to_string()]);
    }
}
