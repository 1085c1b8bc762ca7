// src/pipeline/publish.rs

//! Record publishing.

use tokio::time::Instant;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::models::{PublishOutcome, PublishPayload, Record};
use crate::stream::StreamBackend;
use crate::utils::deadline;

/// Appends records to a stream one message at a time.
pub struct RecordPublisher<'a> {
    backend: &'a dyn StreamBackend,
}

impl<'a> RecordPublisher<'a> {
    pub fn new(backend: &'a dyn StreamBackend) -> Self {
        Self { backend }
    }

    /// Publish `records` in order, each keyed by `partition_key`.
    ///
    /// The first failed append aborts the rest. Records appended before it
    /// stay in the stream.
    pub async fn publish(
        &self,
        stream: &str,
        partition_key: &str,
        records: &[Record],
        deadline: Option<Instant>,
    ) -> Result<PublishOutcome> {
        let mut outcome = PublishOutcome::default();

        for record in records {
            if deadline::expired(deadline) {
                return Err(AppError::PublishDeadline {
                    stream: stream.to_string(),
                    published: outcome.records_added,
                });
            }

            let data = PublishPayload::new(record, partition_key).to_bytes()?;
            let receipt = self
                .backend
                .put_record(stream, partition_key, data)
                .await
                .map_err(|source| AppError::Publish {
                    stream: stream.to_string(),
                    published: outcome.records_added,
                    source,
                })?;

            debug!(
                "Record {} for '{}' stored in {} at {}",
                outcome.records_added + 1,
                partition_key,
                receipt.shard_id,
                receipt.sequence_number
            );
            outcome.records_added += 1;
            outcome.shard_id = Some(receipt.shard_id);
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::stream::{
        MemoryStreams, PutReceipt, StoredRecord, StreamError, StreamResult, StreamSummary,
    };

    fn records(count: usize) -> Vec<Record> {
        (0..count)
            .map(|i| {
                Record::new(
                    format!("2024-04-{:02}T09:00:00Z", i + 1),
                    format!("Title {i}"),
                    format!("https://www.theguardian.com/a/{i}"),
                )
            })
            .collect()
    }

    async fn stream_with_shards(shards: u32) -> MemoryStreams {
        let backend = MemoryStreams::new();
        backend.create_stream("news", shards).await.unwrap();
        backend
    }

    #[tokio::test]
    async fn test_publishes_every_record_in_order() {
        let backend = stream_with_shards(4).await;
        let publisher = RecordPublisher::new(&backend);
        let input = records(3);

        let outcome = publisher
            .publish("news", "football", &input, None)
            .await
            .unwrap();
        assert_eq!(outcome.records_added, 3);
        assert!(outcome.shard_id.is_some());
        assert_eq!(backend.put_calls(), 3);

        let stored = backend.read_records("news", 100).await.unwrap();
        assert_eq!(stored.len(), 3);
        for (i, record) in stored.iter().enumerate() {
            assert_eq!(record.partition_key, "football");
            assert_eq!(record.shard_id, outcome.shard_id.clone().unwrap());
            assert_eq!(
                record.json().unwrap(),
                json!({
                    "webPublicationDate": format!("2024-04-{:02}T09:00:00Z", i + 1),
                    "webTitle": format!("Title {i}"),
                    "webUrl": format!("https://www.theguardian.com/a/{i}"),
                    "keyword": "football"
                })
            );
        }
    }

    #[tokio::test]
    async fn test_empty_batch_returns_no_shard() {
        let backend = stream_with_shards(1).await;
        let outcome = RecordPublisher::new(&backend)
            .publish("news", "football", &[], None)
            .await
            .unwrap();
        assert_eq!(outcome, PublishOutcome::default());
        assert_eq!(backend.put_calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_records() {
        let backend = MemoryStreams::new().fail_puts_after(2);
        backend.create_stream("news", 1).await.unwrap();

        let result = RecordPublisher::new(&backend)
            .publish("news", "football", &records(5), None)
            .await;
        assert!(matches!(
            result,
            Err(AppError::Publish {
                published: 2,
                source: StreamError::Service(_),
                ..
            })
        ));
        assert_eq!(backend.put_calls(), 3);
        assert_eq!(backend.read_records("news", 100).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_stream_is_publish_error() {
        let backend = MemoryStreams::new();
        let result = RecordPublisher::new(&backend)
            .publish("nope", "football", &records(1), None)
            .await;
        assert!(matches!(
            result,
            Err(AppError::Publish {
                published: 0,
                source: StreamError::NotFound(_),
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_deadline_stops_before_append() {
        let backend = stream_with_shards(1).await;
        let deadline = Instant::now();
        tokio::time::advance(Duration::from_millis(1)).await;

        let result = RecordPublisher::new(&backend)
            .publish("news", "football", &records(2), Some(deadline))
            .await;
        assert!(matches!(
            result,
            Err(AppError::PublishDeadline { published: 0, .. })
        ));
        assert_eq!(backend.put_calls(), 0);
    }

    /// Delegates to [`MemoryStreams`], taking 10ms per append.
    struct SlowPuts(MemoryStreams);

    #[async_trait]
    impl StreamBackend for SlowPuts {
        async fn create_stream(&self, name: &str, shard_count: u32) -> StreamResult<()> {
            self.0.create_stream(name, shard_count).await
        }

        async fn increase_retention(&self, name: &str, hours: u32) -> StreamResult<()> {
            self.0.increase_retention(name, hours).await
        }

        async fn put_record(
            &self,
            name: &str,
            partition_key: &str,
            data: Vec<u8>,
        ) -> StreamResult<PutReceipt> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.0.put_record(name, partition_key, data).await
        }

        async fn describe_stream(&self, name: &str) -> StreamResult<StreamSummary> {
            self.0.describe_stream(name).await
        }

        async fn read_records(
            &self,
            name: &str,
            limit_per_shard: u32,
        ) -> StreamResult<Vec<StoredRecord>> {
            self.0.read_records(name, limit_per_shard).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_mid_batch_reports_published_count() {
        let backend = SlowPuts(stream_with_shards(2).await);
        let deadline = Instant::now() + Duration::from_millis(25);

        let result = RecordPublisher::new(&backend)
            .publish("news", "football", &records(5), Some(deadline))
            .await;
        assert!(matches!(
            result,
            Err(AppError::PublishDeadline { published: 3, .. })
        ));
        assert_eq!(backend.0.read_records("news", 100).await.unwrap().len(), 3);
    }
}
