//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AppError, Result};

/// Kinesis caps retention at one year.
const MAX_RETENTION_HOURS: u32 = 8760;

/// Retention a freshly created stream starts with.
pub const DEFAULT_STREAM_RETENTION_HOURS: u32 = 24;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// AWS client settings
    #[serde(default)]
    pub aws: AwsConfig,

    /// Content API settings
    #[serde(default)]
    pub content: ContentConfig,

    /// Where the content API key is kept
    #[serde(default)]
    pub credentials: CredentialConfig,

    /// Stream provisioning settings
    #[serde(default)]
    pub stream: StreamConfig,

    /// Lambda host settings
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Build configuration from defaults plus process environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var("CONFIG_PATH") {
            Ok(path) => Self::load(path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from environment-style key lookups.
    ///
    /// Unparseable numeric values are rejected rather than ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(region) = lookup("AWS_REGION") {
            self.aws.region = region;
        }
        if let Some(url) = lookup("CONTENT_API_URL") {
            self.content.base_url = url;
        }
        if let Some(id) = lookup("CREDENTIAL_SECRET_ID") {
            self.credentials.secret_id = id;
        }

        parse_into(&lookup, "CONTENT_TIMEOUT_SECS", &mut self.content.timeout_secs)?;
        parse_into(&lookup, "CONTENT_PAGE_SIZE", &mut self.content.page_size)?;
        parse_into(&lookup, "STREAM_SHARD_COUNT", &mut self.stream.shard_count)?;
        parse_into(&lookup, "STREAM_RETENTION_HOURS", &mut self.stream.retention_hours)?;
        parse_into(
            &lookup,
            "RETENTION_RETRY_DELAY_MS",
            &mut self.stream.retention_retry.delay_ms,
        )?;
        parse_into(
            &lookup,
            "RETENTION_MAX_WAIT_SECS",
            &mut self.stream.retention_retry.max_wait_secs,
        )?;
        parse_into(
            &lookup,
            "DEADLINE_MARGIN_MS",
            &mut self.runtime.deadline_margin_ms,
        )?;
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.aws.region.trim().is_empty() {
            return Err(AppError::config("aws.region is empty"));
        }
        url::Url::parse(&self.content.base_url)
            .map_err(|e| AppError::config(format!("content.base_url is invalid: {e}")))?;
        if self.content.user_agent.trim().is_empty() {
            return Err(AppError::config("content.user_agent is empty"));
        }
        if self.content.timeout_secs == 0 {
            return Err(AppError::config("content.timeout_secs must be > 0"));
        }
        if !(1..=200).contains(&self.content.page_size) {
            return Err(AppError::config("content.page_size must be within 1..=200"));
        }
        if self.credentials.secret_id.trim().is_empty() {
            return Err(AppError::config("credentials.secret_id is empty"));
        }
        if self.stream.shard_count == 0 {
            return Err(AppError::config("stream.shard_count must be > 0"));
        }
        if self.stream.retention_hours <= DEFAULT_STREAM_RETENTION_HOURS
            || self.stream.retention_hours > MAX_RETENTION_HOURS
        {
            return Err(AppError::config(format!(
                "stream.retention_hours must be within {}..={}",
                DEFAULT_STREAM_RETENTION_HOURS + 1,
                MAX_RETENTION_HOURS
            )));
        }
        let retry = &self.stream.retention_retry;
        if retry.max_attempts == 0 {
            return Err(AppError::config(
                "stream.retention_retry.max_attempts must be > 0",
            ));
        }
        if retry.delay_ms == 0 {
            return Err(AppError::config("stream.retention_retry.delay_ms must be > 0"));
        }
        if retry.max_wait_secs == 0 {
            return Err(AppError::config(
                "stream.retention_retry.max_wait_secs must be > 0",
            ));
        }
        Ok(())
    }
}

fn parse_into<F, T>(lookup: &F, key: &str, target: &mut T) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(raw) = lookup(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|_| AppError::config(format!("{key} has an invalid value: '{raw}'")))?;
    }
    Ok(())
}

/// AWS client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region for the Kinesis and Secrets Manager clients
    #[serde(default = "defaults::region")]
    pub region: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: defaults::region(),
        }
    }
}

/// Content API client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Search endpoint
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Number of results requested per search
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_size: defaults::page_size(),
        }
    }
}

/// Credential lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// Secret id holding the content API key
    #[serde(default = "defaults::secret_id")]
    pub secret_id: String,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            secret_id: defaults::secret_id(),
        }
    }
}

/// Stream provisioning settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Shards requested when a stream is created
    #[serde(default = "defaults::shard_count")]
    pub shard_count: u32,

    /// Retention applied after creation, in hours
    #[serde(default = "defaults::retention_hours")]
    pub retention_hours: u32,

    /// Retry policy for the retention change
    #[serde(default)]
    pub retention_retry: RetryConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            shard_count: defaults::shard_count(),
            retention_hours: defaults::retention_hours(),
            retention_retry: RetryConfig::default(),
        }
    }
}

/// Bounded retry policy for operations that wait on the substrate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Pause between attempts in milliseconds
    #[serde(default = "defaults::retry_delay")]
    pub delay_ms: u64,

    /// Maximum number of attempts
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Maximum total time spent retrying, in seconds
    #[serde(default = "defaults::max_wait")]
    pub max_wait_secs: u64,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delay_ms: defaults::retry_delay(),
            max_attempts: defaults::max_attempts(),
            max_wait_secs: defaults::max_wait(),
        }
    }
}

/// Settings for running under a host with an invocation deadline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Time reserved before the host deadline for logging the outcome
    #[serde(default = "defaults::deadline_margin")]
    pub deadline_margin_ms: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            deadline_margin_ms: defaults::deadline_margin(),
        }
    }
}

mod defaults {
    // AWS defaults
    pub fn region() -> String {
        "eu-west-2".into()
    }

    // Content defaults
    pub fn base_url() -> String {
        "https://content.guardianapis.com/search".into()
    }
    pub fn user_agent() -> String {
        "guardian-streamer/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn page_size() -> u32 {
        10
    }
    pub fn secret_id() -> String {
        "Guardian-Key".into()
    }

    // Stream defaults
    pub fn shard_count() -> u32 {
        15
    }
    pub fn retention_hours() -> u32 {
        72
    }
    pub fn retry_delay() -> u64 {
        50
    }
    pub fn max_attempts() -> u32 {
        2400
    }
    pub fn max_wait() -> u64 {
        120
    }

    pub fn deadline_margin() -> u64 {
        500
    }
}
