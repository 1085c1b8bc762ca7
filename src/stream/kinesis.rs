//! AWS Kinesis Data Streams backend.

use async_trait::async_trait;
use aws_sdk_kinesis::Client;
use aws_sdk_kinesis::error::DisplayErrorContext;
use aws_sdk_kinesis::operation::create_stream::CreateStreamError;
use aws_sdk_kinesis::operation::describe_stream::DescribeStreamError;
use aws_sdk_kinesis::operation::get_records::GetRecordsError;
use aws_sdk_kinesis::operation::get_shard_iterator::GetShardIteratorError;
use aws_sdk_kinesis::operation::increase_stream_retention_period::{
    IncreaseStreamRetentionPeriodError,
};
use aws_sdk_kinesis::operation::put_record::PutRecordError;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::types::ShardIteratorType;
use tracing::debug;

use crate::models::AwsConfig;
use crate::stream::{
    PutReceipt, StoredRecord, StreamBackend, StreamError, StreamResult, StreamSummary,
};
use crate::utils::aws::load_sdk_config;

/// Largest `Limit` a single GetRecords call accepts.
const MAX_GET_RECORDS: u32 = 10_000;

/// Kinesis-backed [`StreamBackend`].
#[derive(Clone)]
pub struct KinesisStreams {
    client: Client,
}

impl KinesisStreams {
    /// Wrap an existing SDK client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client for the configured region.
    pub async fn from_config(config: &AwsConfig) -> Self {
        let sdk_config = load_sdk_config(config).await;
        Self::new(Client::new(&sdk_config))
    }
}

/// Convert a count to the SDK's `i32`, rejecting values it cannot carry.
fn to_i32(value: u32, what: &str) -> StreamResult<i32> {
    i32::try_from(value)
        .map_err(|_| StreamError::InvalidArgument(format!("{what} {value} is out of range")))
}

/// Whether another GetRecords call on a shard can still yield records.
///
/// A fresh TRIM_HORIZON iterator may return an empty batch while the shard
/// holds data further on, so only a caught-up shard or a full limit stops.
fn shard_has_more(taken: u32, limit: u32, millis_behind_latest: Option<i64>) -> bool {
    taken < limit && millis_behind_latest != Some(0)
}

fn create_error(err: CreateStreamError) -> StreamError {
    match err {
        CreateStreamError::ResourceInUseException(e) => StreamError::InUse(e.to_string()),
        CreateStreamError::LimitExceededException(e) => StreamError::LimitExceeded(e.to_string()),
        CreateStreamError::InvalidArgumentException(e) => {
            StreamError::InvalidArgument(e.to_string())
        }
        other => StreamError::Service(DisplayErrorContext(&other).to_string()),
    }
}

fn retention_error(err: IncreaseStreamRetentionPeriodError) -> StreamError {
    use IncreaseStreamRetentionPeriodError as E;

    match err {
        E::ResourceInUseException(e) => StreamError::InUse(e.to_string()),
        E::ResourceNotFoundException(e) => StreamError::NotFound(e.to_string()),
        E::LimitExceededException(e) => StreamError::LimitExceeded(e.to_string()),
        E::InvalidArgumentException(e) => StreamError::InvalidArgument(e.to_string()),
        other => StreamError::Service(DisplayErrorContext(&other).to_string()),
    }
}

fn put_error(err: PutRecordError) -> StreamError {
    match err {
        PutRecordError::ResourceNotFoundException(e) => StreamError::NotFound(e.to_string()),
        PutRecordError::ProvisionedThroughputExceededException(e) => {
            StreamError::LimitExceeded(e.to_string())
        }
        PutRecordError::InvalidArgumentException(e) => StreamError::InvalidArgument(e.to_string()),
        other => StreamError::Service(DisplayErrorContext(&other).to_string()),
    }
}

fn describe_error(err: DescribeStreamError) -> StreamError {
    match err {
        DescribeStreamError::ResourceNotFoundException(e) => StreamError::NotFound(e.to_string()),
        DescribeStreamError::LimitExceededException(e) => {
            StreamError::LimitExceeded(e.to_string())
        }
        DescribeStreamError::InvalidArgumentException(e) => {
            StreamError::InvalidArgument(e.to_string())
        }
        other => StreamError::Service(DisplayErrorContext(&other).to_string()),
    }
}

fn iterator_error(err: GetShardIteratorError) -> StreamError {
    match err {
        GetShardIteratorError::ResourceNotFoundException(e) => {
            StreamError::NotFound(e.to_string())
        }
        GetShardIteratorError::ProvisionedThroughputExceededException(e) => {
            StreamError::LimitExceeded(e.to_string())
        }
        GetShardIteratorError::InvalidArgumentException(e) => {
            StreamError::InvalidArgument(e.to_string())
        }
        other => StreamError::Service(DisplayErrorContext(&other).to_string()),
    }
}

fn records_error(err: GetRecordsError) -> StreamError {
    match err {
        GetRecordsError::ResourceNotFoundException(e) => StreamError::NotFound(e.to_string()),
        GetRecordsError::ProvisionedThroughputExceededException(e) => {
            StreamError::LimitExceeded(e.to_string())
        }
        GetRecordsError::InvalidArgumentException(e) => {
            StreamError::InvalidArgument(e.to_string())
        }
        other => StreamError::Service(DisplayErrorContext(&other).to_string()),
    }
}

#[async_trait]
impl StreamBackend for KinesisStreams {
    async fn create_stream(&self, name: &str, shard_count: u32) -> StreamResult<()> {
        self.client
            .create_stream()
            .stream_name(name)
            .shard_count(to_i32(shard_count, "shard count")?)
            .send()
            .await
            .map_err(|e| create_error(e.into_service_error()))?;
        Ok(())
    }

    async fn increase_retention(&self, name: &str, hours: u32) -> StreamResult<()> {
        self.client
            .increase_stream_retention_period()
            .stream_name(name)
            .retention_period_hours(to_i32(hours, "retention hours")?)
            .send()
            .await
            .map_err(|e| retention_error(e.into_service_error()))?;
        Ok(())
    }

    async fn put_record(
        &self,
        name: &str,
        partition_key: &str,
        data: Vec<u8>,
    ) -> StreamResult<PutReceipt> {
        let output = self
            .client
            .put_record()
            .stream_name(name)
            .partition_key(partition_key)
            .data(Blob::new(data))
            .send()
            .await
            .map_err(|e| put_error(e.into_service_error()))?;

        Ok(PutReceipt {
            shard_id: output.shard_id().to_string(),
            sequence_number: output.sequence_number().to_string(),
        })
    }

    async fn describe_stream(&self, name: &str) -> StreamResult<StreamSummary> {
        let output = self
            .client
            .describe_stream()
            .stream_name(name)
            .send()
            .await
            .map_err(|e| describe_error(e.into_service_error()))?;

        let description = output
            .stream_description
            .ok_or_else(|| StreamError::Service(format!("No description returned for {name}")))?;

        Ok(StreamSummary {
            name: description.stream_name().to_string(),
            status: description.stream_status().as_str().to_string(),
            shard_ids: description
                .shards()
                .iter()
                .map(|shard| shard.shard_id().to_string())
                .collect(),
            retention_hours: description.retention_period_hours().max(0) as u32,
        })
    }

    async fn read_records(
        &self,
        name: &str,
        limit_per_shard: u32,
    ) -> StreamResult<Vec<StoredRecord>> {
        let summary = self.describe_stream(name).await?;
        let mut records = Vec::new();
        if limit_per_shard == 0 {
            return Ok(records);
        }

        for shard_id in &summary.shard_ids {
            let iterator = self
                .client
                .get_shard_iterator()
                .stream_name(name)
                .shard_id(shard_id)
                .shard_iterator_type(ShardIteratorType::TrimHorizon)
                .send()
                .await
                .map_err(|e| iterator_error(e.into_service_error()))?;

            let mut next = iterator.shard_iterator().map(str::to_string);
            let mut taken: u32 = 0;

            while let Some(iterator) = next.take() {
                let remaining = (limit_per_shard - taken).min(MAX_GET_RECORDS);
                let output = self
                    .client
                    .get_records()
                    .shard_iterator(iterator)
                    .limit(to_i32(remaining, "record limit")?)
                    .send()
                    .await
                    .map_err(|e| records_error(e.into_service_error()))?;

                taken += output.records().len() as u32;
                records.extend(output.records().iter().map(|record| StoredRecord {
                    shard_id: shard_id.clone(),
                    sequence_number: record.sequence_number().to_string(),
                    partition_key: record.partition_key().to_string(),
                    data: record.data().as_ref().to_vec(),
                }));

                if shard_has_more(taken, limit_per_shard, output.millis_behind_latest()) {
                    next = output.next_shard_iterator().map(str::to_string);
                }
            }
            debug!("Read {} records from shard {}", taken, shard_id);
        }

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_kinesis::types::error::{
        InvalidArgumentException, LimitExceededException, ProvisionedThroughputExceededException,
        ResourceInUseException, ResourceNotFoundException,
    };

    use super::*;

    #[test]
    fn test_create_in_use_means_exists() {
        let err = CreateStreamError::ResourceInUseException(
            ResourceInUseException::builder().message("exists").build(),
        );
        assert!(matches!(create_error(err), StreamError::InUse(_)));
    }

    #[test]
    fn test_create_limit_and_invalid_argument() {
        let limit = CreateStreamError::LimitExceededException(
            LimitExceededException::builder().message("too many").build(),
        );
        assert!(matches!(create_error(limit), StreamError::LimitExceeded(_)));

        let invalid = CreateStreamError::InvalidArgumentException(
            InvalidArgumentException::builder().message("bad").build(),
        );
        assert!(matches!(create_error(invalid), StreamError::InvalidArgument(_)));
    }

    #[test]
    fn test_retention_transient_classes() {
        use IncreaseStreamRetentionPeriodError as E;

        let not_found = E::ResourceNotFoundException(
            ResourceNotFoundException::builder().message("missing").build(),
        );
        assert!(matches!(retention_error(not_found), StreamError::NotFound(_)));

        let in_use =
            E::ResourceInUseException(ResourceInUseException::builder().message("busy").build());
        assert!(matches!(retention_error(in_use), StreamError::InUse(_)));

        let limit =
            E::LimitExceededException(LimitExceededException::builder().message("slow").build());
        assert!(matches!(retention_error(limit), StreamError::LimitExceeded(_)));

        let invalid =
            E::InvalidArgumentException(InvalidArgumentException::builder().message("bad").build());
        assert!(matches!(retention_error(invalid), StreamError::InvalidArgument(_)));
    }

    #[test]
    fn test_put_error_classes() {
        let not_found = PutRecordError::ResourceNotFoundException(
            ResourceNotFoundException::builder().message("missing").build(),
        );
        assert!(matches!(put_error(not_found), StreamError::NotFound(_)));

        let throttled = PutRecordError::ProvisionedThroughputExceededException(
            ProvisionedThroughputExceededException::builder()
                .message("slow down")
                .build(),
        );
        assert!(matches!(put_error(throttled), StreamError::LimitExceeded(_)));
    }

    #[test]
    fn test_read_error_classes() {
        let describe = DescribeStreamError::ResourceNotFoundException(
            ResourceNotFoundException::builder().message("missing").build(),
        );
        assert!(matches!(describe_error(describe), StreamError::NotFound(_)));

        let iterator = GetShardIteratorError::InvalidArgumentException(
            InvalidArgumentException::builder().message("bad shard").build(),
        );
        assert!(matches!(iterator_error(iterator), StreamError::InvalidArgument(_)));

        let records = GetRecordsError::ProvisionedThroughputExceededException(
            ProvisionedThroughputExceededException::builder()
                .message("slow down")
                .build(),
        );
        assert!(matches!(records_error(records), StreamError::LimitExceeded(_)));
    }

    #[test]
    fn test_empty_batch_behind_latest_keeps_reading() {
        assert!(shard_has_more(0, 100, Some(86_400_000)));
        assert!(shard_has_more(0, 100, None));
    }

    #[test]
    fn test_stops_when_caught_up_or_full() {
        assert!(!shard_has_more(3, 100, Some(0)));
        assert!(!shard_has_more(100, 100, Some(5_000)));
    }

    #[test]
    fn test_to_i32_rejects_overflow() {
        assert_eq!(to_i32(15, "shard count").unwrap(), 15);
        assert!(matches!(
            to_i32(u32::MAX, "shard count"),
            Err(StreamError::InvalidArgument(_))
        ));
    }
}
