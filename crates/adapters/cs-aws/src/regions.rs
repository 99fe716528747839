//! Region enumeration.

use aws_config::SdkConfig;
use cs_error::ApiError;
use cs_types::Region;
use tracing::info;

use crate::error::classify_sdk_error;

/// Enumerate the regions enabled for the account, sorted by code.
pub async fn describe_regions(sdk_config: &SdkConfig) -> Result<Vec<Region>, ApiError> {
    let client = aws_sdk_ec2::Client::new(sdk_config);

    let output = client
        .describe_regions()
        .send()
        .await
        .map_err(classify_sdk_error)?;

    let mut regions: Vec<Region> = output
        .regions()
        .iter()
        .filter_map(|r| r.region_name())
        .map(Region::from)
        .collect();
    regions.sort();

    info!(count = regions.len(), "Enumerated account regions");
    Ok(regions)
}
