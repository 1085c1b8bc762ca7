//! Utility functions and helpers.

#[cfg(feature = "aws")]
pub mod aws;
pub mod deadline;
pub mod http;
