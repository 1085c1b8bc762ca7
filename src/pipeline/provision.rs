// src/pipeline/provision.rs

//! Stream provisioning.
//!
//! `ensure_stream` is the only synchronization point between concurrent
//! invocations targeting the same stream name. It relies on the substrate's
//! atomic create: exactly one caller sees the create succeed, everyone else
//! sees `InUse` and backs off. The winner then raises retention, retrying
//! while the new stream is still propagating.

use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::{StreamConfig, StreamStatus};
use crate::stream::{StreamBackend, StreamError};
use crate::utils::deadline;

/// Creates streams on demand and configures their retention.
pub struct StreamProvisioner<'a> {
    backend: &'a dyn StreamBackend,
    config: &'a StreamConfig,
}

impl<'a> StreamProvisioner<'a> {
    pub fn new(backend: &'a dyn StreamBackend, config: &'a StreamConfig) -> Self {
        Self { backend, config }
    }

    /// Make sure `name` exists.
    ///
    /// Returns [`StreamStatus::AlreadyExists`] without further calls when
    /// another invocation created it first.
    pub async fn ensure_stream(
        &self,
        name: &str,
        deadline: Option<Instant>,
    ) -> Result<StreamStatus> {
        match self
            .backend
            .create_stream(name, self.config.shard_count)
            .await
        {
            Ok(()) => {
                info!(
                    "Created stream {} with {} shards",
                    name, self.config.shard_count
                );
            }
            Err(StreamError::InUse(_)) => {
                debug!("Stream {} already exists", name);
                return Ok(StreamStatus::AlreadyExists);
            }
            Err(e) => return Err(AppError::provisioning(name, e)),
        }

        self.extend_retention(name, deadline).await?;
        Ok(StreamStatus::Created)
    }

    /// Raise retention on a just-created stream.
    ///
    /// `NotFound` and `InUse` mean the stream is still propagating and are
    /// retried; every other error is fatal.
    async fn extend_retention(&self, name: &str, deadline: Option<Instant>) -> Result<()> {
        let policy = &self.config.retention_retry;
        let hours = self.config.retention_hours;
        let started = Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            match self.backend.increase_retention(name, hours).await {
                Ok(()) => {
                    info!(
                        "Retention for stream {} set to {}h after {} attempt(s)",
                        name, hours, attempts
                    );
                    return Ok(());
                }
                Err(e @ (StreamError::NotFound(_) | StreamError::InUse(_))) => {
                    if attempts >= policy.max_attempts || started.elapsed() >= policy.max_wait() {
                        debug!(
                            "Giving up on retention for stream {} after {} attempts: {}",
                            name, attempts, e
                        );
                        return Err(AppError::RetentionTimeout {
                            stream: name.to_string(),
                            attempts,
                        });
                    }
                    debug!("Stream {} not ready for retention change: {}", name, e);
                    deadline::check(deadline, "provisioning")?;
                    sleep(policy.delay()).await;
                }
                Err(e) => return Err(AppError::provisioning(name, e)),
            }
        }
    }
}
