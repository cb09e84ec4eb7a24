//! In-memory fakes for the adapter traits and builders for trigger payloads.
//!
//! Enabled by the default `test-helpers` feature so unit and integration
//! tests share the same fakes.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::sync::Mutex;

use bucket_relay_core::temp_scan::ObjectSummary;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::adapters::object_store::{ObjectListingPage, ObjectStore};
use crate::adapters::queue::MessageQueue;

const DEFAULT_PAGE_SIZE: usize = 1_000;
const COPY_CLOCK_START_SECS: i64 = 1_700_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredObject {
    body: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// Buckets kept in key order, listed the way S3 lists them.
pub struct InMemoryObjectStore {
    buckets: Mutex<BTreeMap<String, BTreeMap<String, StoredObject>>>,
    page_size: usize,
    copy_clock_secs: Mutex<i64>,
    failing_operations: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            buckets: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
            copy_clock_secs: Mutex::new(COPY_CLOCK_START_SECS),
            failing_operations: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn put_object(&self, bucket: &str, key: &str, body: &[u8], modified_secs: i64) {
        let last_modified = DateTime::from_timestamp(modified_secs, 0).unwrap_or_default();
        self.buckets
            .lock()
            .expect("poisoned mutex")
            .entry(bucket.to_string())
            .or_default()
            .insert(
                key.to_string(),
                StoredObject {
                    body: body.to_vec(),
                    last_modified,
                },
            );
    }

    pub fn body(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.buckets
            .lock()
            .expect("poisoned mutex")
            .get(bucket)
            .and_then(|objects| objects.get(key))
            .map(|object| object.body.clone())
    }

    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.buckets
            .lock()
            .expect("poisoned mutex")
            .get(bucket)
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Makes every later call of `operation` (S3 API name) fail.
    pub fn fail_operation(&self, operation: &str) {
        self.failing_operations
            .lock()
            .expect("poisoned mutex")
            .insert(operation.to_string());
    }

    /// Recorded calls as `operation bucket/key`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    fn record(&self, operation: &str, bucket: &str, key: &str) -> Result<(), String> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(format!("{operation} {bucket}/{key}"));
        if self
            .failing_operations
            .lock()
            .expect("poisoned mutex")
            .contains(operation)
        {
            return Err(format!("simulated {operation} failure for {bucket}/{key}"));
        }
        Ok(())
    }

    fn next_copy_time(&self) -> DateTime<Utc> {
        let mut clock = self.copy_clock_secs.lock().expect("poisoned mutex");
        *clock += 1;
        DateTime::from_timestamp(*clock, 0).unwrap_or_default()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn object_size(&self, bucket: &str, key: &str) -> Result<u64, String> {
        self.record("head_object", bucket, key)?;
        self.body(bucket, key)
            .map(|body| body.len() as u64)
            .ok_or_else(|| format!("NoSuchKey: {bucket}/{key}"))
    }

    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<(), String> {
        self.record("copy_object", destination_bucket, destination_key)?;
        let body = self
            .body(source_bucket, source_key)
            .ok_or_else(|| format!("NoSuchKey: {source_bucket}/{source_key}"))?;
        let last_modified = self.next_copy_time();
        self.buckets
            .lock()
            .expect("poisoned mutex")
            .entry(destination_bucket.to_string())
            .or_default()
            .insert(
                destination_key.to_string(),
                StoredObject {
                    body,
                    last_modified,
                },
            );
        Ok(())
    }

    fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectListingPage, String> {
        self.record("list_objects_v2", bucket, continuation_token.unwrap_or(""))?;
        let buckets = self.buckets.lock().expect("poisoned mutex");
        let Some(objects) = buckets.get(bucket) else {
            return Ok(ObjectListingPage::default());
        };

        let start = match continuation_token {
            Some(token) => Bound::Excluded(token.to_string()),
            None => Bound::Unbounded,
        };
        let mut remaining = objects.range((start, Bound::Unbounded));
        let page: Vec<ObjectSummary> = remaining
            .by_ref()
            .take(self.page_size)
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size_bytes: object.body.len() as u64,
                last_modified: object.last_modified,
            })
            .collect();

        let next_continuation_token = if remaining.next().is_some() {
            page.last().map(|object| object.key.clone())
        } else {
            None
        };

        Ok(ObjectListingPage {
            objects: page,
            next_continuation_token,
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), String> {
        self.record("delete_object", bucket, key)?;
        if let Some(objects) = self.buckets.lock().expect("poisoned mutex").get_mut(bucket) {
            objects.remove(key);
        }
        Ok(())
    }
}

/// Records sent and deleted messages per queue URL.
#[derive(Default)]
pub struct RecordingQueue {
    sent: Mutex<Vec<(String, String)>>,
    deleted: Mutex<Vec<(String, String)>>,
    failing_operations: Mutex<HashSet<String>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_operation(&self, operation: &str) {
        self.failing_operations
            .lock()
            .expect("poisoned mutex")
            .insert(operation.to_string());
    }

    /// `(queue_url, body)` pairs in send order.
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("poisoned mutex").clone()
    }

    /// `(queue_url, receipt_handle)` pairs in delete order.
    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().expect("poisoned mutex").clone()
    }

    fn check(&self, operation: &str) -> Result<(), String> {
        if self
            .failing_operations
            .lock()
            .expect("poisoned mutex")
            .contains(operation)
        {
            return Err(format!("simulated {operation} failure"));
        }
        Ok(())
    }
}

impl MessageQueue for RecordingQueue {
    fn send_message(&self, queue_url: &str, body: &str) -> Result<(), String> {
        self.check("send_message")?;
        self.sent
            .lock()
            .expect("poisoned mutex")
            .push((queue_url.to_string(), body.to_string()));
        Ok(())
    }

    fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<(), String> {
        self.check("delete_message")?;
        self.deleted
            .lock()
            .expect("poisoned mutex")
            .push((queue_url.to_string(), receipt_handle.to_string()));
        Ok(())
    }
}

/// Object-creation event as a bucket notification delivers it.
pub fn object_created_event(bucket: &str, raw_key: &str) -> Value {
    json!({
        "Records": [{
            "eventSource": "aws:s3",
            "eventName": "ObjectCreated:Put",
            "s3": {
                "bucket": {"name": bucket},
                "object": {"key": raw_key, "sequencer": "0055AED6DCD90281E5"}
            }
        }]
    })
}

/// Queue body wrapping an object-creation event in a notification envelope.
pub fn notification_body(bucket: &str, raw_key: &str) -> String {
    json!({
        "Type": "Notification",
        "TopicArn": "arn:aws:sns:us-east-1:123456789012:uploads",
        "Message": object_created_event(bucket, raw_key).to_string(),
    })
    .to_string()
}

/// Queue-triggered invocation payload from `(receipt_handle, body)` pairs.
pub fn queue_event(messages: &[(&str, String)]) -> Value {
    let records: Vec<Value> = messages
        .iter()
        .enumerate()
        .map(|(index, (receipt_handle, body))| {
            json!({
                "messageId": format!("message-{index}"),
                "receiptHandle": receipt_handle,
                "body": body,
                "eventSource": "aws:sqs",
                "eventSourceARN": "arn:aws:sqs:us-east-1:123456789012:relay",
            })
        })
        .collect();
    json!({ "Records": records })
}
