// src/models/mod.rs

//! Domain models for the streamer.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod event;
mod record;

// Re-export all public types
pub use config::{
    AwsConfig, Config, ContentConfig, CredentialConfig, DEFAULT_STREAM_RETENTION_HOURS,
    RetryConfig, RuntimeConfig, StreamConfig,
};
pub use event::{PipelineRequest, TriggerEvent};
pub use record::{PublishOutcome, PublishPayload, Record, StreamStatus};
