//! AWS Lambda entry point for the Guardian content streamer.
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//!
//! ## Environment Variables
//!
//! - `CONFIG_PATH`: optional TOML config bundled with the function
//! - `AWS_REGION`: region for Kinesis and Secrets Manager
//! - `CREDENTIAL_SECRET_ID`: secret holding the content API key
//! - `STREAM_SHARD_COUNT`, `STREAM_RETENTION_HOURS`: stream settings
//! - `RETENTION_RETRY_DELAY_MS`, `RETENTION_MAX_WAIT_SECS`: retention retry policy
//! - `DEADLINE_MARGIN_MS`: time reserved before the invocation deadline
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use std::sync::Arc;

use guardian_streamer::lambda::handler;
use guardian_streamer::models::Config;
use guardian_streamer::pipeline::Pipeline;
use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Guardian streamer Lambda starting...");

    let config = Config::from_env()?;
    let pipeline = Arc::new(Pipeline::from_aws(config).await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let pipeline = Arc::clone(&pipeline);
        async move { handler(&pipeline, event).await }
    }))
    .await
}
