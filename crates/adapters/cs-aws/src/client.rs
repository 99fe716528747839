//! AWS client configuration and loading.

use aws_config::{BehaviorVersion, SdkConfig};
use serde::{Deserialize, Serialize};

/// Configuration for AWS access.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Default region for API calls that are not region-scoped
    pub region: Option<String>,

    /// Custom endpoint URL (for LocalStack)
    pub endpoint: Option<String>,

    /// AWS profile name (optional)
    pub profile: Option<String>,
}

impl AwsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set a custom endpoint (for LocalStack).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the AWS profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

/// Load the shared SDK configuration.
///
/// Credentials resolve through the SDK default chain; only region,
/// endpoint and profile are overridable here.
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    use aws_config::Region;

    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }

    if let Some(endpoint) = &config.endpoint {
        loader = loader.endpoint_url(endpoint);
    }

    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    loader.load().await
}

/// Build a region-scoped EC2 client from the shared configuration.
pub(crate) fn ec2_client(
    sdk_config: &SdkConfig,
    region: &cs_types::Region,
) -> aws_sdk_ec2::Client {
    let config = aws_sdk_ec2::config::Builder::from(sdk_config)
        .region(aws_config::Region::new(region.as_str().to_string()))
        .build();
    aws_sdk_ec2::Client::from_conf(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aws_config_builder() {
        let config = AwsConfig::new()
            .with_region("us-east-1")
            .with_endpoint("http://localhost:4566")
            .with_profile("scanner");

        assert_eq!(config.region, Some("us-east-1".to_string()));
        assert_eq!(config.endpoint, Some("http://localhost:4566".to_string()));
        assert_eq!(config.profile, Some("scanner".to_string()));
    }

    #[test]
    fn test_aws_config_default() {
        let config = AwsConfig::default();
        assert!(config.region.is_none());
        assert!(config.endpoint.is_none());
        assert!(config.profile.is_none());
    }
}
