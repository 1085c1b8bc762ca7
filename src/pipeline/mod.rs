//! Pipeline entry points.
//!
//! - `StreamProvisioner`: create-or-reuse a stream and raise its retention
//! - `RecordPublisher`: append filtered records one message at a time
//! - `Pipeline`: run one trigger event end to end

pub mod orchestrator;
pub mod provision;
pub mod publish;

pub use orchestrator::{Pipeline, PipelineOutcome, PipelineStage, failure_message};
pub use provision::StreamProvisioner;
pub use publish::RecordPublisher;
