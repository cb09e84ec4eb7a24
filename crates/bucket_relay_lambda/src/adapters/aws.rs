//! S3 and SQS implementations of the adapter traits.
//!
//! Handlers are synchronous; each call here parks the current worker with
//! `block_in_place` and drives the SDK future on the ambient runtime, so the
//! binaries must run on the multi-threaded Tokio runtime.

use std::future::Future;

use aws_sdk_s3::error::DisplayErrorContext;
use bucket_relay_core::object_keys::copy_source;
use bucket_relay_core::temp_scan::ObjectSummary;
use chrono::{DateTime, Utc};

use crate::adapters::object_store::{ObjectListingPage, ObjectStore};
use crate::adapters::queue::MessageQueue;

fn block_on<F: Future>(future: F) -> F::Output {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

#[derive(Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
}

impl S3ObjectStore {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

impl ObjectStore for S3ObjectStore {
    fn object_size(&self, bucket: &str, key: &str) -> Result<u64, String> {
        block_on(async {
            self.client
                .head_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map(|output| {
                    output
                        .content_length()
                        .and_then(|length| u64::try_from(length).ok())
                        .unwrap_or(0)
                })
                .map_err(|error| {
                    format!(
                        "failed to read object metadata from s3: {}",
                        DisplayErrorContext(&error)
                    )
                })
        })
    }

    fn copy_object(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<(), String> {
        block_on(async {
            self.client
                .copy_object()
                .bucket(destination_bucket)
                .key(destination_key)
                .copy_source(copy_source(source_bucket, source_key))
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    format!("failed to copy object in s3: {}", DisplayErrorContext(&error))
                })
        })
    }

    fn list_objects_page(
        &self,
        bucket: &str,
        continuation_token: Option<&str>,
    ) -> Result<ObjectListingPage, String> {
        let output = block_on(async {
            self.client
                .list_objects_v2()
                .bucket(bucket)
                .set_continuation_token(continuation_token.map(str::to_string))
                .send()
                .await
                .map_err(|error| {
                    format!("failed to list objects in s3: {}", DisplayErrorContext(&error))
                })
        })?;

        let objects = output
            .contents()
            .iter()
            .filter_map(|object| {
                Some(ObjectSummary {
                    key: object.key()?.to_string(),
                    size_bytes: object
                        .size()
                        .and_then(|size| u64::try_from(size).ok())
                        .unwrap_or(0),
                    last_modified: object.last_modified().map(to_utc).unwrap_or_default(),
                })
            })
            .collect();

        let next_continuation_token = if output.is_truncated().unwrap_or(false) {
            output.next_continuation_token().map(str::to_string)
        } else {
            None
        };

        Ok(ObjectListingPage {
            objects,
            next_continuation_token,
        })
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<(), String> {
        block_on(async {
            self.client
                .delete_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    format!(
                        "failed to delete object from s3: {}",
                        DisplayErrorContext(&error)
                    )
                })
        })
    }
}

fn to_utc(value: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos()).unwrap_or_default()
}

#[derive(Clone)]
pub struct SqsMessageQueue {
    client: aws_sdk_sqs::Client,
}

impl SqsMessageQueue {
    pub fn new(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

impl MessageQueue for SqsMessageQueue {
    fn send_message(&self, queue_url: &str, body: &str) -> Result<(), String> {
        block_on(async {
            self.client
                .send_message()
                .queue_url(queue_url)
                .message_body(body)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    format!(
                        "failed to enqueue message: {}",
                        aws_sdk_sqs::error::DisplayErrorContext(&error)
                    )
                })
        })
    }

    fn delete_message(&self, queue_url: &str, receipt_handle: &str) -> Result<(), String> {
        block_on(async {
            self.client
                .delete_message()
                .queue_url(queue_url)
                .receipt_handle(receipt_handle)
                .send()
                .await
                .map(|_| ())
                .map_err(|error| {
                    format!(
                        "failed to delete queue message: {}",
                        aws_sdk_sqs::error::DisplayErrorContext(&error)
                    )
                })
        })
    }
}
