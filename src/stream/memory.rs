//! In-memory stream substrate.
//!
//! Behaves like a Kinesis account in a single process: creation is atomic,
//! a new stream can stay invisible or busy for a configurable number of
//! retention calls, and records are routed to shards by hashing the
//! partition key. Used by tests and by the CLI's `--memory` mode.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::models::DEFAULT_STREAM_RETENTION_HOURS;
use crate::stream::{
    PutReceipt, StoredRecord, StreamBackend, StreamError, StreamResult, StreamSummary,
};

#[derive(Debug)]
struct MemoryStream {
    retention_hours: u32,
    /// Retention calls still answered with `NotFound`
    pending_not_found: u32,
    /// Retention calls still answered with `InUse`
    pending_in_use: u32,
    shards: Vec<Vec<StoredRecord>>,
    next_sequence: u64,
}

impl MemoryStream {
    fn is_active(&self) -> bool {
        self.pending_not_found == 0 && self.pending_in_use == 0
    }

    fn shard_for(&self, partition_key: &str) -> usize {
        let digest = Sha256::digest(partition_key.as_bytes());
        let mut top = [0u8; 8];
        top.copy_from_slice(&digest[..8]);
        let hash = u64::from_be_bytes(top) as u128;
        ((hash * self.shards.len() as u128) >> 64) as usize
    }
}

fn shard_id(index: usize) -> String {
    format!("shardId-{index:012}")
}

/// Process-local [`StreamBackend`].
#[derive(Debug, Default)]
pub struct MemoryStreams {
    streams: Mutex<HashMap<String, MemoryStream>>,
    not_found_polls: u32,
    in_use_polls: u32,
    fail_puts_after: Option<usize>,
    create_calls: AtomicUsize,
    retention_calls: AtomicUsize,
    put_calls: AtomicUsize,
    successful_puts: AtomicUsize,
}

impl MemoryStreams {
    /// Create an empty substrate where new streams are usable immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// New streams answer the first `not_found` retention calls with
    /// `NotFound` and the next `in_use` with `InUse`.
    pub fn with_propagation_delay(mut self, not_found: u32, in_use: u32) -> Self {
        self.not_found_polls = not_found;
        self.in_use_polls = in_use;
        self
    }

    /// Fail every put after `count` successful ones.
    pub fn fail_puts_after(mut self, count: usize) -> Self {
        self.fail_puts_after = Some(count);
        self
    }

    /// Number of `create_stream` calls received.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Number of `increase_retention` calls received.
    pub fn retention_calls(&self) -> usize {
        self.retention_calls.load(Ordering::SeqCst)
    }

    /// Number of `put_record` calls received.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    /// Number of streams that exist.
    pub fn stream_count(&self) -> usize {
        self.lock().map(|streams| streams.len()).unwrap_or(0)
    }

    fn lock(&self) -> StreamResult<MutexGuard<'_, HashMap<String, MemoryStream>>> {
        self.streams
            .lock()
            .map_err(|e| StreamError::Service(format!("stream table poisoned: {e}")))
    }
}

#[async_trait]
impl StreamBackend for MemoryStreams {
    async fn create_stream(&self, name: &str, shard_count: u32) -> StreamResult<()> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if shard_count == 0 {
            return Err(StreamError::InvalidArgument(
                "shard count must be at least 1".into(),
            ));
        }

        let mut streams = self.lock()?;
        if streams.contains_key(name) {
            return Err(StreamError::InUse(format!("Stream {name} already exists")));
        }

        streams.insert(
            name.to_string(),
            MemoryStream {
                retention_hours: DEFAULT_STREAM_RETENTION_HOURS,
                pending_not_found: self.not_found_polls,
                pending_in_use: self.in_use_polls,
                shards: vec![Vec::new(); shard_count as usize],
                next_sequence: 0,
            },
        );
        Ok(())
    }

    async fn increase_retention(&self, name: &str, hours: u32) -> StreamResult<()> {
        self.retention_calls.fetch_add(1, Ordering::SeqCst);

        let mut streams = self.lock()?;
        let stream = streams
            .get_mut(name)
            .ok_or_else(|| StreamError::NotFound(format!("Stream {name} not found")))?;

        if stream.pending_not_found > 0 {
            stream.pending_not_found -= 1;
            return Err(StreamError::NotFound(format!("Stream {name} not found")));
        }
        if stream.pending_in_use > 0 {
            stream.pending_in_use -= 1;
            return Err(StreamError::InUse(format!(
                "Stream {name} is in CREATING state"
            )));
        }
        if hours < stream.retention_hours {
            return Err(StreamError::InvalidArgument(format!(
                "Requested retention {hours}h is below current {}h",
                stream.retention_hours
            )));
        }

        stream.retention_hours = hours;
        Ok(())
    }

    async fn put_record(
        &self,
        name: &str,
        partition_key: &str,
        data: Vec<u8>,
    ) -> StreamResult<PutReceipt> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(limit) = self.fail_puts_after {
            if self.successful_puts.load(Ordering::SeqCst) >= limit {
                return Err(StreamError::Service("injected put failure".into()));
            }
        }

        let mut streams = self.lock()?;
        let stream = streams
            .get_mut(name)
            .filter(|stream| stream.is_active())
            .ok_or_else(|| StreamError::NotFound(format!("Stream {name} not found")))?;

        let index = stream.shard_for(partition_key);
        stream.next_sequence += 1;
        let receipt = PutReceipt {
            shard_id: shard_id(index),
            sequence_number: format!("{:020}", stream.next_sequence),
        };
        stream.shards[index].push(StoredRecord {
            shard_id: receipt.shard_id.clone(),
            sequence_number: receipt.sequence_number.clone(),
            partition_key: partition_key.to_string(),
            data,
        });

        self.successful_puts.fetch_add(1, Ordering::SeqCst);
        Ok(receipt)
    }

    async fn describe_stream(&self, name: &str) -> StreamResult<StreamSummary> {
        let streams = self.lock()?;
        let stream = streams
            .get(name)
            .filter(|stream| stream.pending_not_found == 0)
            .ok_or_else(|| StreamError::NotFound(format!("Stream {name} not found")))?;

        Ok(StreamSummary {
            name: name.to_string(),
            status: if stream.is_active() { "ACTIVE" } else { "CREATING" }.to_string(),
            shard_ids: (0..stream.shards.len()).map(shard_id).collect(),
            retention_hours: stream.retention_hours,
        })
    }

    async fn read_records(
        &self,
        name: &str,
        limit_per_shard: u32,
    ) -> StreamResult<Vec<StoredRecord>> {
        let streams = self.lock()?;
        let stream = streams
            .get(name)
            .filter(|stream| stream.is_active())
            .ok_or_else(|| StreamError::NotFound(format!("Stream {name} not found")))?;

        Ok(stream
            .shards
            .iter()
            .flat_map(|shard| shard.iter().take(limit_per_shard as usize).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_is_exclusive() {
        let streams = MemoryStreams::new();
        streams.create_stream("news", 2).await.unwrap();
        assert!(matches!(
            streams.create_stream("news", 2).await,
            Err(StreamError::InUse(_))
        ));
        assert_eq!(streams.stream_count(), 1);
        assert_eq!(streams.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_propagation_delay_sequence() {
        let streams = MemoryStreams::new().with_propagation_delay(1, 2);
        streams.create_stream("news", 1).await.unwrap();

        assert!(matches!(
            streams.increase_retention("news", 72).await,
            Err(StreamError::NotFound(_))
        ));
        assert!(matches!(
            streams.increase_retention("news", 72).await,
            Err(StreamError::InUse(_))
        ));
        assert!(matches!(
            streams.increase_retention("news", 72).await,
            Err(StreamError::InUse(_))
        ));
        streams.increase_retention("news", 72).await.unwrap();

        let summary = streams.describe_stream("news").await.unwrap();
        assert_eq!(summary.status, "ACTIVE");
        assert_eq!(summary.retention_hours, 72);
    }

    #[tokio::test]
    async fn test_same_key_lands_on_same_shard_in_order() {
        let streams = MemoryStreams::new();
        streams.create_stream("news", 8).await.unwrap();

        let mut shards = Vec::new();
        for i in 0..5 {
            let receipt = streams
                .put_record("news", "football", format!("{{\"n\":{i}}}").into_bytes())
                .await
                .unwrap();
            shards.push(receipt.shard_id);
        }
        assert!(shards.windows(2).all(|w| w[0] == w[1]));

        let records = streams.read_records("news", 100).await.unwrap();
        let order: Vec<i64> = records
            .iter()
            .map(|r| r.json().unwrap()["n"].as_i64().unwrap())
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_put_to_missing_stream() {
        let streams = MemoryStreams::new();
        assert!(matches!(
            streams.put_record("nope", "k", Vec::new()).await,
            Err(StreamError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_fail_puts_after() {
        let streams = MemoryStreams::new().fail_puts_after(1);
        streams.create_stream("news", 1).await.unwrap();
        streams.put_record("news", "k", b"{}".to_vec()).await.unwrap();
        assert!(matches!(
            streams.put_record("news", "k", b"{}".to_vec()).await,
            Err(StreamError::Service(_))
        ));
        assert_eq!(streams.put_calls(), 2);
    }

    #[tokio::test]
    async fn test_retention_cannot_decrease() {
        let streams = MemoryStreams::new();
        streams.create_stream("news", 1).await.unwrap();
        streams.increase_retention("news", 72).await.unwrap();
        assert!(matches!(
            streams.increase_retention("news", 48).await,
            Err(StreamError::InvalidArgument(_))
        ));
    }
}
