use bucket_relay_core::config::LoggerConfig;
use bucket_relay_lambda::adapters::aws::{S3ObjectStore, SqsMessageQueue};
use bucket_relay_lambda::handlers::logger::{handle_logger_event, LoggerResponse};
use bucket_relay_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<LoggerResponse, Error> {
    let config = LoggerConfig::from_env().inspect_err(|error| {
        tracing::error!(component = "logger", event = "misconfigured", "{error}");
    })?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config));
    let queue = SqsMessageQueue::new(aws_sdk_sqs::Client::new(&aws_config));

    Ok(handle_logger_event(
        &event.payload,
        &config,
        &store,
        &queue,
    )?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
