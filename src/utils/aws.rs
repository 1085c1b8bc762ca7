// src/utils/aws.rs

//! AWS SDK configuration.

use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::models::AwsConfig;

/// Load shared SDK configuration pinned to the configured region.
///
/// Credentials still come from the default provider chain.
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await
}
