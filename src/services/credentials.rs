// src/services/credentials.rs

//! Credential lookup for the content API key.

use async_trait::async_trait;

use crate::error::{AppError, Result};

/// Source of secret strings.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Return the secret stored under `id`.
    ///
    /// Fails with [`AppError::CredentialNotFound`] when no such secret exists.
    async fn get_credential(&self, id: &str) -> Result<String>;
}

/// A single secret known up front, e.g. passed on the command line.
pub struct StaticCredential {
    id: String,
    secret: String,
}

impl StaticCredential {
    pub fn new(id: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredential {
    async fn get_credential(&self, id: &str) -> Result<String> {
        if id == self.id {
            Ok(self.secret.clone())
        } else {
            Err(AppError::CredentialNotFound { id: id.to_string() })
        }
    }
}

#[cfg(feature = "aws")]
pub use secrets_manager::SecretsManagerSource;

#[cfg(feature = "aws")]
mod secrets_manager {
    use aws_sdk_secretsmanager::Client;
    use aws_sdk_secretsmanager::error::DisplayErrorContext;
    use aws_sdk_secretsmanager::operation::get_secret_value::GetSecretValueError;
    use async_trait::async_trait;
    use tracing::debug;

    use super::CredentialSource;
    use crate::error::{AppError, Result};
    use crate::models::AwsConfig;
    use crate::utils::aws::load_sdk_config;

    /// AWS Secrets Manager backed credential source.
    #[derive(Clone)]
    pub struct SecretsManagerSource {
        client: Client,
    }

    impl SecretsManagerSource {
        pub fn new(client: Client) -> Self {
            Self { client }
        }

        /// Build a client for the configured region.
        pub async fn from_config(config: &AwsConfig) -> Self {
            let sdk_config = load_sdk_config(config).await;
            Self::new(Client::new(&sdk_config))
        }
    }

    #[async_trait]
    impl CredentialSource for SecretsManagerSource {
        async fn get_credential(&self, id: &str) -> Result<String> {
            debug!("Fetching secret {}", id);
            let output = self
                .client
                .get_secret_value()
                .secret_id(id)
                .send()
                .await
                .map_err(|err| match err.into_service_error() {
                    GetSecretValueError::ResourceNotFoundException(_) => {
                        AppError::CredentialNotFound { id: id.to_string() }
                    }
                    other => AppError::credential(id, DisplayErrorContext(&other)),
                })?;

            output
                .secret_string()
                .map(str::to_string)
                .ok_or_else(|| AppError::credential(id, "secret has no string value"))
        }
    }
}
