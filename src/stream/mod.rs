//! Stream substrate abstractions.
//!
//! The pipeline talks to a durable, partitioned, append-only log through
//! [`StreamBackend`]. Two backends are provided:
//!
//! - [`KinesisStreams`]: AWS Kinesis Data Streams (feature `aws`)
//! - [`MemoryStreams`]: process-local substrate for tests and dry runs

#[cfg(feature = "aws")]
pub mod kinesis;
pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[cfg(feature = "aws")]
pub use kinesis::KinesisStreams;
pub use memory::MemoryStreams;

/// Result type alias for substrate calls.
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Substrate error classes the pipeline distinguishes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Resource already exists or is not in a state that allows the call
    #[error("resource in use: {0}")]
    InUse(String),

    /// Stream does not exist (or is not yet visible)
    #[error("resource not found: {0}")]
    NotFound(String),

    /// Request rate or resource limits exceeded
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Request rejected as invalid
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other service or transport failure
    #[error("{0}")]
    Service(String),
}

/// Acknowledgement for a single appended record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    pub shard_id: String,
    pub sequence_number: String,
}

/// Point-in-time description of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamSummary {
    pub name: String,
    pub status: String,
    pub shard_ids: Vec<String>,
    pub retention_hours: u32,
}

/// A record read back from a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub shard_id: String,
    pub sequence_number: String,
    pub partition_key: String,
    pub data: Vec<u8>,
}

impl StoredRecord {
    /// Decode the payload as JSON.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.data)
    }
}

/// Trait for stream substrate clients.
#[async_trait]
pub trait StreamBackend: Send + Sync {
    /// Create `name` with `shard_count` shards.
    ///
    /// Must be atomic: exactly one concurrent caller succeeds, the rest get
    /// [`StreamError::InUse`].
    async fn create_stream(&self, name: &str, shard_count: u32) -> StreamResult<()>;

    /// Raise the retention period of `name` to `hours`.
    async fn increase_retention(&self, name: &str, hours: u32) -> StreamResult<()>;

    /// Append one record, routed by `partition_key`.
    async fn put_record(
        &self,
        name: &str,
        partition_key: &str,
        data: Vec<u8>,
    ) -> StreamResult<PutReceipt>;

    /// Describe `name`.
    async fn describe_stream(&self, name: &str) -> StreamResult<StreamSummary>;

    /// Read up to `limit_per_shard` records from the start of every shard,
    /// shard by shard in shard order.
    async fn read_records(&self, name: &str, limit_per_shard: u32)
    -> StreamResult<Vec<StoredRecord>>;
}
