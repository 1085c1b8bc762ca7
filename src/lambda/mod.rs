// src/lambda/mod.rs

//! AWS Lambda handler for the streamer.
//!
//! Each invocation carries `date_from`, `search_term` and `stream_id`. The
//! handler always returns `Ok`: failures are reported through the log line
//! and the response body, and recovery is left to whoever re-triggers.

use std::time::Duration;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::models::TriggerEvent;
use crate::pipeline::{Pipeline, PipelineOutcome};
use crate::utils::deadline::deadline_from_system_time;

/// Lambda response payload.
#[derive(Debug, Serialize)]
pub struct InvocationResponse {
    /// `success` or `error`
    pub status: &'static str,

    /// Number of records appended to the stream
    pub records_added: usize,

    /// Target stream, when the event named one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<String>,

    /// The outcome's log line
    pub message: String,

    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl InvocationResponse {
    pub fn from_outcome(
        outcome: &PipelineOutcome,
        stream_id: Option<&str>,
        elapsed: Duration,
    ) -> Self {
        Self {
            status: if outcome.is_success() { "success" } else { "error" },
            records_added: outcome.records_added(),
            stream_id: stream_id.map(str::to_string),
            message: outcome.message(),
            execution_time_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Main Lambda handler function.
#[instrument(skip(pipeline, event))]
pub async fn handler(
    pipeline: &Pipeline,
    event: LambdaEvent<Value>,
) -> std::result::Result<InvocationResponse, LambdaError> {
    let start = std::time::Instant::now();
    let (payload, context) = event.into_parts();
    info!(request_id = %context.request_id, "Handling event");

    let margin = Duration::from_millis(pipeline.config().runtime.deadline_margin_ms);
    let deadline = deadline_from_system_time(context.deadline(), margin);

    let trigger = TriggerEvent::from_payload(&payload);
    let outcome = pipeline.run(&trigger, Some(deadline)).await;

    Ok(InvocationResponse::from_outcome(
        &outcome,
        trigger.stream_id_hint(),
        start.elapsed(),
    ))
}
