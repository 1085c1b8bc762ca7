//! Service layer for the streamer.
//!
//! This module contains the external collaborators the pipeline consumes:
//! - Content search (`ContentSource`, `GuardianClient`, `filter_results`)
//! - Credential lookup (`CredentialSource`, `SecretsManagerSource`)

mod content;
mod credentials;

pub use content::{ContentSource, GuardianClient, filter_results, parse_search_response};
#[cfg(feature = "aws")]
pub use credentials::SecretsManagerSource;
pub use credentials::{CredentialSource, StaticCredential};
