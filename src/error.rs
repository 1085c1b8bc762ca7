// src/error.rs

//! Unified error handling for the streamer.

use std::fmt;

use thiserror::Error;

use crate::stream::StreamError;

/// Result type alias for streamer operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// Every failure the pipeline can hit is one variant here; the orchestrator
/// picks its log line by matching on the variant, never on rendered text.
#[derive(Error, Debug)]
pub enum AppError {
    /// Trigger parameter missing or not a string
    #[error("Parameter ({field}) must be of type string")]
    InputType { field: &'static str },

    /// Trigger parameter is an empty string
    #[error("Parameter ({field}) cannot be an empty string")]
    InputEmpty { field: &'static str },

    /// Trigger parameter contains only whitespace
    #[error("Parameter ({field}) cannot contain only whitespace")]
    InputWhitespace { field: &'static str },

    /// `date_from` is not `YYYY-MM-DD`
    #[error("Parameter (date_from) must be formatted as YYYY-MM-DD, got '{value}'")]
    DateFormat { value: String },

    /// `date_from` is today or later
    #[error("Parameter (date_from) must be before current date, got {value}")]
    DateNotPast { value: String },

    /// The secret store has no entry for the credential id
    #[error("Credential '{id}' not found")]
    CredentialNotFound { id: String },

    /// Secret store failure other than a missing entry
    #[error("Credential '{id}' could not be retrieved: {message}")]
    Credential { id: String, message: String },

    /// Content API answered with a non-success status
    #[error("Content API returned HTTP {status}")]
    ContentFetchHttp { status: u16 },

    /// Non-transient substrate fault while creating or configuring a stream
    #[error("Failed to provision stream {stream}: {source}")]
    Provisioning {
        stream: String,
        #[source]
        source: StreamError,
    },

    /// Retention extension gave up after its retry budget
    #[error("Stream {stream} did not accept retention change after {attempts} attempts")]
    RetentionTimeout { stream: String, attempts: u32 },

    /// Substrate fault while appending a record
    #[error("Failed to publish to stream {stream} after {published} records: {source}")]
    Publish {
        stream: String,
        published: usize,
        #[source]
        source: StreamError,
    },

    /// The host deadline passed partway through a batch
    #[error("Deadline exceeded publishing to stream {stream} after {published} records")]
    PublishDeadline { stream: String, published: usize },

    /// Substrate call outside provisioning and publishing (describe, read)
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// The host deadline passed at a blocking boundary
    #[error("Deadline exceeded during {stage}")]
    DeadlineExceeded { stage: &'static str },

    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a credential retrieval error.
    pub fn credential(id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Credential {
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// Create a provisioning error for `stream`.
    pub fn provisioning(stream: impl Into<String>, source: StreamError) -> Self {
        Self::Provisioning {
            stream: stream.into(),
            source,
        }
    }

    /// Whether the error was raised by input validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InputType { .. }
                | Self::InputEmpty { .. }
                | Self::InputWhitespace { .. }
                | Self::DateFormat { .. }
                | Self::DateNotPast { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_field_name() {
        let err = AppError::InputEmpty { field: "stream_id" };
        assert_eq!(
            err.to_string(),
            "Parameter (stream_id) cannot be an empty string"
        );
    }

    #[test]
    fn test_is_validation() {
        assert!(AppError::InputType { field: "search_term" }.is_validation());
        assert!(
            AppError::DateFormat {
                value: "nope".into()
            }
            .is_validation()
        );
        assert!(!AppError::ContentFetchHttp { status: 401 }.is_validation());
    }

    #[test]
    fn test_provisioning_keeps_source() {
        let err = AppError::provisioning("news", StreamError::LimitExceeded("too many".into()));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("news"));
    }
}
