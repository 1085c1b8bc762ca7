//! Guardian streamer CLI
//!
//! Local execution entry point. For AWS Lambda, use `guardian-streamer-lambda`.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use guardian_streamer::{
    error::Result,
    models::{Config, TriggerEvent},
    pipeline::{Pipeline, PipelineOutcome},
    services::{CredentialSource, GuardianClient, SecretsManagerSource, StaticCredential},
    stream::{KinesisStreams, MemoryStreams, StreamBackend},
};

/// Guardian streamer - publish news search results to a stream
#[derive(Parser, Debug)]
#[command(name = "guardian-streamer", version, about = "Guardian content to Kinesis streamer")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the pipeline once for a search
    Run {
        /// Earliest publication date (YYYY-MM-DD)
        #[arg(long)]
        date_from: String,

        /// Search term, also used as the partition key
        #[arg(long)]
        search_term: String,

        /// Target stream name
        #[arg(long)]
        stream_id: String,

        /// Use the content API key directly instead of Secrets Manager
        #[arg(long, env = "GUARDIAN_KEY")]
        api_key: Option<String>,

        /// Publish to an in-process stream instead of Kinesis
        #[arg(long)]
        memory: bool,
    },

    /// Print every record currently in a stream
    Read {
        /// Stream name
        #[arg(long)]
        stream_id: String,

        /// Maximum records per shard
        #[arg(long, default_value_t = 100)]
        limit: u32,
    },

    /// Validate configuration file
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env(|key| std::env::var(key).ok())?;
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run {
            date_from,
            search_term,
            stream_id,
            api_key,
            memory,
        } => {
            config.validate()?;

            let credentials: Arc<dyn CredentialSource> = match api_key {
                Some(key) => Arc::new(StaticCredential::new(
                    config.credentials.secret_id.clone(),
                    key,
                )),
                None => Arc::new(SecretsManagerSource::from_config(&config.aws).await),
            };
            let streams: Arc<dyn StreamBackend> = if memory {
                Arc::new(MemoryStreams::new())
            } else {
                Arc::new(KinesisStreams::from_config(&config.aws).await)
            };
            let content = Arc::new(GuardianClient::new(&config.content)?);

            let pipeline = Pipeline::new(Arc::new(config), credentials, content, streams);
            let event = TriggerEvent::new(date_from, search_term, stream_id.clone());
            let outcome = pipeline.run(&event, None).await;

            if let PipelineOutcome::Failed { error, .. } = outcome {
                return Err(error);
            }
            if memory {
                print_records(pipeline.streams(), &stream_id, 100).await?;
            }
        }

        Command::Read { stream_id, limit } => {
            let streams = KinesisStreams::from_config(&config.aws).await;
            print_records(&streams, &stream_id, limit).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
            log::info!(
                "  stream: {} shards, {}h retention, region {}",
                config.stream.shard_count,
                config.stream.retention_hours,
                config.aws.region
            );
            log::info!("  content: {}", config.content.base_url);
        }
    }

    Ok(())
}

/// Describe a stream and dump its records as JSON lines.
async fn print_records(streams: &dyn StreamBackend, stream_id: &str, limit: u32) -> Result<()> {
    let summary = streams.describe_stream(stream_id).await?;
    log::info!(
        "Stream {} is {} with {} shards, {}h retention",
        summary.name,
        summary.status,
        summary.shard_ids.len(),
        summary.retention_hours
    );

    let records = streams.read_records(stream_id, limit).await?;
    for record in &records {
        let payload = record.json().unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&record.data).into_owned())
        });
        println!(
            "{}",
            serde_json::json!({
                "shard_id": record.shard_id,
                "sequence_number": record.sequence_number,
                "partition_key": record.partition_key,
                "data": payload,
            })
        );
    }
    log::info!("{} records in {}", records.len(), stream_id);
    Ok(())
}
