// src/pipeline/orchestrator.rs

//! End-to-end pipeline for one trigger event.
//!
//! Validating → Authenticating → Fetching → Filtering → Provisioning →
//! Publishing → Done. Any stage can end in `Failed`; the failure is turned
//! into exactly one log line and never raised to the caller.

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{error, info};

use crate::error::{AppError, Result};
use crate::models::{Config, StreamStatus, TriggerEvent};
use crate::pipeline::{RecordPublisher, StreamProvisioner};
use crate::services::{ContentSource, CredentialSource, filter_results};
use crate::stream::StreamBackend;
use crate::validation::validate_event;

/// Pipeline stage, used to attribute failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Authenticating,
    Fetching,
    Filtering,
    Provisioning,
    Publishing,
    Done,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validating => "validating",
            Self::Authenticating => "authenticating",
            Self::Fetching => "fetching",
            Self::Filtering => "filtering",
            Self::Provisioning => "provisioning",
            Self::Publishing => "publishing",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one invocation.
#[derive(Debug)]
pub enum PipelineOutcome {
    Done {
        stream_id: String,
        records_added: usize,
        shard_id: Option<String>,
        stream_status: StreamStatus,
    },
    Failed {
        stage: PipelineStage,
        error: AppError,
    },
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done { .. })
    }

    /// Records durably appended, including those written before a failure.
    pub fn records_added(&self) -> usize {
        match self {
            Self::Done { records_added, .. } => *records_added,
            Self::Failed { error, .. } => match error {
                AppError::Publish { published, .. }
                | AppError::PublishDeadline { published, .. } => *published,
                _ => 0,
            },
        }
    }

    /// The log line this outcome is reported with.
    pub fn message(&self) -> String {
        match self {
            Self::Done {
                stream_id,
                records_added,
                ..
            } => format!("{records_added} records added to stream: {stream_id}."),
            Self::Failed { stage, error } => failure_message(*stage, error),
        }
    }

    fn log(&self) {
        match self {
            Self::Done {
                stream_id,
                shard_id,
                stream_status,
                ..
            } => info!(
                stream_id = %stream_id,
                shard_id = shard_id.as_deref().unwrap_or("none"),
                stream_status = ?stream_status,
                "{}",
                self.message()
            ),
            Self::Failed { stage, .. } => error!(stage = %stage, "{}", self.message()),
        }
    }
}

/// Map a failure to its single log line.
pub fn failure_message(stage: PipelineStage, error: &AppError) -> String {
    match error {
        AppError::InputType { field } => format!("Invalid input parameter type ({field})."),
        AppError::InputEmpty { field } => format!("Empty input parameter ({field})."),
        AppError::InputWhitespace { field } => format!("Invalid input parameter ({field})."),
        AppError::DateFormat { .. } => {
            "Invalid date format (date_from): expected YYYY-MM-DD.".to_string()
        }
        AppError::DateNotPast { .. } => {
            "Invalid date (date_from): must be before current date.".to_string()
        }
        AppError::CredentialNotFound { id } => format!("Credential not found ({id})."),
        AppError::ContentFetchHttp { status } => {
            format!("Content request failed with HTTP status {status}.")
        }
        AppError::Provisioning { stream, source } => {
            format!("Failed to provision stream {stream}: {source}")
        }
        AppError::RetentionTimeout { stream, attempts } => format!(
            "Failed to provision stream {stream}: \
             retention change not accepted after {attempts} attempts"
        ),
        AppError::Publish {
            stream,
            published,
            source,
        } => format!("Failed to publish to stream {stream} after {published} records: {source}"),
        AppError::PublishDeadline { stream, published } => format!(
            "Failed to publish to stream {stream} after {published} records: deadline exceeded"
        ),
        other => format!("{stage} failed: {other}"),
    }
}

/// Wires the collaborators together for repeated invocations.
pub struct Pipeline {
    config: Arc<Config>,
    credentials: Arc<dyn CredentialSource>,
    content: Arc<dyn ContentSource>,
    streams: Arc<dyn StreamBackend>,
}

impl Pipeline {
    pub fn new(
        config: Arc<Config>,
        credentials: Arc<dyn CredentialSource>,
        content: Arc<dyn ContentSource>,
        streams: Arc<dyn StreamBackend>,
    ) -> Self {
        Self {
            config,
            credentials,
            content,
            streams,
        }
    }

    /// Build a pipeline backed by Secrets Manager, the Guardian API and Kinesis.
    #[cfg(feature = "aws")]
    pub async fn from_aws(config: Config) -> Result<Self> {
        use crate::services::{GuardianClient, SecretsManagerSource};
        use crate::stream::KinesisStreams;

        let content = GuardianClient::new(&config.content)?;
        let credentials = SecretsManagerSource::from_config(&config.aws).await;
        let streams = KinesisStreams::from_config(&config.aws).await;

        Ok(Self::new(
            Arc::new(config),
            Arc::new(credentials),
            Arc::new(content),
            Arc::new(streams),
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn streams(&self) -> &dyn StreamBackend {
        self.streams.as_ref()
    }

    /// Run one invocation to a terminal outcome and log it.
    pub async fn run(&self, event: &TriggerEvent, deadline: Option<Instant>) -> PipelineOutcome {
        let mut stage = PipelineStage::Validating;
        let outcome = match self.execute(event, deadline, &mut stage).await {
            Ok(outcome) => outcome,
            Err(error) => PipelineOutcome::Failed { stage, error },
        };
        outcome.log();
        outcome
    }

    async fn execute(
        &self,
        event: &TriggerEvent,
        deadline: Option<Instant>,
        stage: &mut PipelineStage,
    ) -> Result<PipelineOutcome> {
        let request = validate_event(event)?;

        *stage = PipelineStage::Authenticating;
        let api_key = self
            .credentials
            .get_credential(&self.config.credentials.secret_id)
            .await?;

        *stage = PipelineStage::Fetching;
        let items = self
            .content
            .fetch(&api_key, &request.search_term, &request.date_from_param())
            .await?;

        *stage = PipelineStage::Filtering;
        let records = filter_results(&items);

        *stage = PipelineStage::Provisioning;
        let stream_status = StreamProvisioner::new(self.streams.as_ref(), &self.config.stream)
            .ensure_stream(&request.stream_id, deadline)
            .await?;

        *stage = PipelineStage::Publishing;
        let published = RecordPublisher::new(self.streams.as_ref())
            .publish(&request.stream_id, &request.search_term, &records, deadline)
            .await?;

        *stage = PipelineStage::Done;
        Ok(PipelineOutcome::Done {
            stream_id: request.stream_id,
            records_added: published.records_added,
            shard_id: published.shard_id,
            stream_status,
        })
    }
}
