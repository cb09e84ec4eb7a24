use bucket_relay_core::config::CleanerConfig;
use bucket_relay_lambda::adapters::aws::S3ObjectStore;
use bucket_relay_lambda::handlers::cleaner::{handle_cleaner_event, CleanerOutcome};
use bucket_relay_lambda::telemetry::init_tracing;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;

async fn handle_request(event: LambdaEvent<Value>) -> Result<CleanerOutcome, Error> {
    let config = CleanerConfig::from_env().inspect_err(|error| {
        tracing::error!(component = "cleaner", event = "misconfigured", "{error}");
    })?;

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = S3ObjectStore::new(aws_sdk_s3::Client::new(&aws_config));

    Ok(handle_cleaner_event(&event.payload, &config, &store)?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();
    lambda_runtime::run(service_fn(handle_request)).await
}
