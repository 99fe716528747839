//! Wiring: adapters -> orchestrator -> report aggregation.

use anyhow::Context;
use cs_aws::{describe_regions, load_sdk_config, AwsConfig, Ec2Scanner, S3Scanner};
use cs_orchestrator::Orchestrator;
use cs_pricing::PricingTable;
use cs_traits::ServiceDescriptor;
use cs_types::{Region, ScanResult};
use std::sync::Arc;
use tracing::info;

use crate::args::Cli;

/// The region S3 buckets are attributed to when no explicit region list
/// pins one down.
const DEFAULT_GLOBAL_REGION: &str = "us-east-1";

/// Run a full scan and aggregate the result.
pub async fn execute(args: Cli) -> anyhow::Result<ScanResult> {
    let aws_config = AwsConfig {
        region: args.aws_region.clone(),
        endpoint: args.endpoint.clone(),
        profile: args.profile.clone(),
    };
    let sdk_config = load_sdk_config(&aws_config).await;

    let regions: Vec<Region> = if args.regions.is_empty() {
        describe_regions(&sdk_config)
            .await
            .map_err(cs_error::CsError::Api)
            .context("enumerating account regions")?
    } else {
        args.regions.iter().map(Region::new).collect()
    };
    info!(regions = regions.len(), "Scanning regions");

    // S3 is global; its task does real work in exactly one region
    let home_region = regions
        .iter()
        .find(|r| r.as_str() == DEFAULT_GLOBAL_REGION)
        .or_else(|| regions.first())
        .cloned()
        .unwrap_or_else(|| Region::from(DEFAULT_GLOBAL_REGION));

    let services = vec![
        ServiceDescriptor::new(Arc::new(Ec2Scanner::new(sdk_config.clone()))),
        ServiceDescriptor::new(Arc::new(S3Scanner::new(&sdk_config, home_region))),
    ];

    let orchestrator = Orchestrator::new(args.scan_config(), services)?;
    let raw = orchestrator.scan(&regions).await?;

    Ok(cs_report::aggregate(raw, &PricingTable::builtin()))
}
