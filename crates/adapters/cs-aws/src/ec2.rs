//! EC2 resource scanner.
//!
//! One scanner walks every EC2 resource kind the pricing table knows:
//! instances, EBS volumes, snapshots, Elastic IPs and NAT gateways. The
//! walk is expressed as a single paged enumeration so the orchestrator's
//! pagination loop drives it; the continuation token carries the current
//! phase plus the underlying API token (`"volumes:abc123"`).

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::types::{Address, Instance, NatGateway, Snapshot, Tag, Volume};
use aws_sdk_ec2::Client;
use chrono::{DateTime, Utc};
use cs_error::ApiError;
use cs_traits::{ResourcePage, ServiceScanner};
use cs_types::{Region, ResourceRecord};
use std::collections::BTreeMap;

use crate::client::ec2_client;
use crate::error::classify_sdk_error;

/// Scans EC2 resources across five enumeration phases.
///
/// Terminated instances and deleted volumes or NAT gateways are skipped;
/// they no longer exist in any useful sense.
pub struct Ec2Scanner {
    sdk_config: SdkConfig,
}

impl Ec2Scanner {
    pub fn new(sdk_config: SdkConfig) -> Self {
        Self { sdk_config }
    }
}

#[async_trait]
impl ServiceScanner for Ec2Scanner {
    fn service_name(&self) -> &str {
        "EC2"
    }

    async fn fetch_page(
        &self,
        region: &Region,
        token: Option<&str>,
    ) -> Result<ResourcePage, ApiError> {
        let client = ec2_client(&self.sdk_config, region);
        let (phase, api_token) = parse_token(token)?;

        let (items, api_next) = match phase {
            Phase::Instances => fetch_instances(&client, region, api_token).await?,
            Phase::Volumes => fetch_volumes(&client, region, api_token).await?,
            Phase::Snapshots => fetch_snapshots(&client, region, api_token).await?,
            Phase::Addresses => fetch_addresses(&client, region).await?,
            Phase::NatGateways => fetch_nat_gateways(&client, region, api_token).await?,
        };

        Ok(match continuation(phase, api_next) {
            Some(next) => ResourcePage::with_next(items, next),
            None => ResourcePage::last(items),
        })
    }
}

/// One resource kind in the enumeration walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Instances,
    Volumes,
    Snapshots,
    Addresses,
    NatGateways,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Instances => "instances",
            Phase::Volumes => "volumes",
            Phase::Snapshots => "snapshots",
            Phase::Addresses => "addresses",
            Phase::NatGateways => "nat-gateways",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "instances" => Some(Phase::Instances),
            "volumes" => Some(Phase::Volumes),
            "snapshots" => Some(Phase::Snapshots),
            "addresses" => Some(Phase::Addresses),
            "nat-gateways" => Some(Phase::NatGateways),
            _ => None,
        }
    }

    fn next(self) -> Option<Self> {
        match self {
            Phase::Instances => Some(Phase::Volumes),
            Phase::Volumes => Some(Phase::Snapshots),
            Phase::Snapshots => Some(Phase::Addresses),
            Phase::Addresses => Some(Phase::NatGateways),
            Phase::NatGateways => None,
        }
    }
}

/// Split a continuation token into its phase and the wrapped API token.
/// No token means the walk starts at the first phase.
fn parse_token(token: Option<&str>) -> Result<(Phase, Option<&str>), ApiError> {
    let Some(token) = token else {
        return Ok((Phase::Instances, None));
    };

    let (name, inner) = match token.split_once(':') {
        Some((name, inner)) => (name, Some(inner)),
        None => (token, None),
    };
    let phase = Phase::parse(name).ok_or_else(|| {
        ApiError::Malformed(format!("unrecognized continuation token {token:?}"))
    })?;

    Ok((phase, inner.filter(|i| !i.is_empty())))
}

/// The next continuation token: more pages in this phase, then the next
/// phase, then done.
fn continuation(phase: Phase, api_next: Option<String>) -> Option<String> {
    match api_next {
        Some(next) => Some(format!("{}:{next}", phase.as_str())),
        None => phase.next().map(|p| p.as_str().to_string()),
    }
}

async fn fetch_instances(
    client: &Client,
    region: &Region,
    token: Option<&str>,
) -> Result<(Vec<ResourceRecord>, Option<String>), ApiError> {
    let mut request = client.describe_instances();
    if let Some(token) = token {
        request = request.next_token(token);
    }
    let output = request.send().await.map_err(classify_sdk_error)?;

    let mut items = Vec::new();
    for reservation in output.reservations() {
        for instance in reservation.instances() {
            if let Some(record) = map_instance(instance, region) {
                items.push(record);
            }
        }
    }
    Ok((items, output.next_token().map(str::to_string)))
}

async fn fetch_volumes(
    client: &Client,
    region: &Region,
    token: Option<&str>,
) -> Result<(Vec<ResourceRecord>, Option<String>), ApiError> {
    let mut request = client.describe_volumes();
    if let Some(token) = token {
        request = request.next_token(token);
    }
    let output = request.send().await.map_err(classify_sdk_error)?;

    let items = output
        .volumes()
        .iter()
        .filter_map(|v| map_volume(v, region))
        .collect();
    Ok((items, output.next_token().map(str::to_string)))
}

async fn fetch_snapshots(
    client: &Client,
    region: &Region,
    token: Option<&str>,
) -> Result<(Vec<ResourceRecord>, Option<String>), ApiError> {
    // Owned snapshots only; the public set is unbounded
    let mut request = client.describe_snapshots().owner_ids("self");
    if let Some(token) = token {
        request = request.next_token(token);
    }
    let output = request.send().await.map_err(classify_sdk_error)?;

    let items = output
        .snapshots()
        .iter()
        .filter_map(|s| map_snapshot(s, region))
        .collect();
    Ok((items, output.next_token().map(str::to_string)))
}

async fn fetch_addresses(
    client: &Client,
    region: &Region,
) -> Result<(Vec<ResourceRecord>, Option<String>), ApiError> {
    // DescribeAddresses is not paginated
    let output = client
        .describe_addresses()
        .send()
        .await
        .map_err(classify_sdk_error)?;

    let items = output
        .addresses()
        .iter()
        .filter_map(|a| map_address(a, region))
        .collect();
    Ok((items, None))
}

async fn fetch_nat_gateways(
    client: &Client,
    region: &Region,
    token: Option<&str>,
) -> Result<(Vec<ResourceRecord>, Option<String>), ApiError> {
    let mut request = client.describe_nat_gateways();
    if let Some(token) = token {
        request = request.next_token(token);
    }
    let output = request.send().await.map_err(classify_sdk_error)?;

    let items = output
        .nat_gateways()
        .iter()
        .filter_map(|n| map_nat_gateway(n, region))
        .collect();
    Ok((items, output.next_token().map(str::to_string)))
}

fn collect_tags(tags: &[Tag]) -> BTreeMap<String, String> {
    tags.iter()
        .filter_map(|t| Some((t.key()?.to_string(), t.value()?.to_string())))
        .collect()
}

/// Map one SDK instance onto a record; `None` for terminated instances
/// and instances without an id.
fn map_instance(instance: &Instance, region: &Region) -> Option<ResourceRecord> {
    let state = instance.state().and_then(|s| s.name()).map(|n| n.as_str());
    if state == Some("terminated") {
        return None;
    }

    let id = instance.instance_id()?;
    let tags = collect_tags(instance.tags());

    let mut record = ResourceRecord::new("EC2", region.clone(), id, "Instance");
    if let Some(name) = tags.get("Name") {
        record = record.with_name(name);
    }
    if let Some(state) = state {
        record = record.with_state(state);
    }
    if let Some(launched) = instance.launch_time().and_then(to_chrono) {
        record = record.with_created_at(launched);
    }
    record = record.with_tags(tags);

    if let Some(instance_type) = instance.instance_type() {
        record = record.with_attribute("instance_type", instance_type.as_str());
    }
    if let Some(ip) = instance.public_ip_address() {
        record = record.with_attribute("public_ip", ip);
    }
    if let Some(ip) = instance.private_ip_address() {
        record = record.with_attribute("private_ip", ip);
    }
    if let Some(vpc) = instance.vpc_id() {
        record = record.with_attribute("vpc_id", vpc);
    }
    if let Some(subnet) = instance.subnet_id() {
        record = record.with_attribute("subnet_id", subnet);
    }
    if let Some(az) = instance.placement().and_then(|p| p.availability_zone()) {
        record = record.with_attribute("availability_zone", az);
    }
    if let Some(arch) = instance.architecture() {
        record = record.with_attribute("architecture", arch.as_str());
    }

    Some(record)
}

/// Map one EBS volume; `None` for deleted volumes and volumes without an
/// id.
fn map_volume(volume: &Volume, region: &Region) -> Option<ResourceRecord> {
    let state = volume.state().map(|s| s.as_str());
    if state == Some("deleted") {
        return None;
    }

    let id = volume.volume_id()?;
    let tags = collect_tags(volume.tags());

    let mut record = ResourceRecord::new("EC2", region.clone(), id, "Volume");
    if let Some(name) = tags.get("Name") {
        record = record.with_name(name);
    }
    if let Some(state) = state {
        record = record.with_state(state);
    }
    if let Some(created) = volume.create_time().and_then(to_chrono) {
        record = record.with_created_at(created);
    }
    record = record.with_tags(tags);

    if let Some(volume_type) = volume.volume_type() {
        record = record.with_attribute("volume_type", volume_type.as_str());
    }
    if let Some(size) = volume.size() {
        record = record.with_attribute("size_gb", size.to_string());
    }
    if let Some(iops) = volume.iops() {
        record = record.with_attribute("iops", iops.to_string());
    }
    if let Some(encrypted) = volume.encrypted() {
        record = record.with_attribute("encrypted", encrypted.to_string());
    }
    if let Some(az) = volume.availability_zone() {
        record = record.with_attribute("availability_zone", az);
    }
    record = record.with_attribute("attachments", volume.attachments().len().to_string());

    Some(record)
}

/// Map one EBS snapshot; the description stands in for a missing Name
/// tag.
fn map_snapshot(snapshot: &Snapshot, region: &Region) -> Option<ResourceRecord> {
    let id = snapshot.snapshot_id()?;
    let tags = collect_tags(snapshot.tags());

    let mut record = ResourceRecord::new("EC2", region.clone(), id, "Snapshot");
    match (tags.get("Name"), snapshot.description()) {
        (Some(name), _) => record = record.with_name(name),
        (None, Some(description)) if !description.is_empty() => {
            record = record.with_name(description)
        }
        _ => {}
    }
    if let Some(state) = snapshot.state() {
        record = record.with_state(state.as_str());
    }
    if let Some(started) = snapshot.start_time().and_then(to_chrono) {
        record = record.with_created_at(started);
    }
    record = record.with_tags(tags);

    if let Some(size) = snapshot.volume_size() {
        record = record.with_attribute("size_gb", size.to_string());
    }
    if let Some(progress) = snapshot.progress() {
        record = record.with_attribute("progress", progress);
    }
    if let Some(encrypted) = snapshot.encrypted() {
        record = record.with_attribute("encrypted", encrypted.to_string());
    }

    Some(record)
}

/// Map one Elastic IP. Attachment decides whether it accrues cost, so it
/// is carried both as the state and as an attribute.
fn map_address(address: &Address, region: &Region) -> Option<ResourceRecord> {
    let id = address.allocation_id()?;
    let tags = collect_tags(address.tags());
    let attached = address.instance_id().is_some();

    let mut record = ResourceRecord::new("EC2", region.clone(), id, "ElasticIp")
        .with_state(if attached { "attached" } else { "unattached" })
        .with_attribute("attached", attached.to_string());
    if let Some(name) = tags.get("Name") {
        record = record.with_name(name);
    }
    record = record.with_tags(tags);

    if let Some(ip) = address.public_ip() {
        record = record.with_attribute("public_ip", ip);
    }
    if let Some(domain) = address.domain() {
        record = record.with_attribute("domain", domain.as_str());
    }
    if let Some(instance) = address.instance_id() {
        record = record.with_attribute("instance_id", instance);
    }
    if let Some(ip) = address.private_ip_address() {
        record = record.with_attribute("private_ip", ip);
    }

    Some(record)
}

/// Map one NAT gateway; `None` for gateways that are gone or never came
/// up.
fn map_nat_gateway(nat: &NatGateway, region: &Region) -> Option<ResourceRecord> {
    let state = nat.state().map(|s| s.as_str());
    if matches!(state, Some("deleted") | Some("deleting") | Some("failed")) {
        return None;
    }

    let id = nat.nat_gateway_id()?;
    let tags = collect_tags(nat.tags());

    let mut record = ResourceRecord::new("EC2", region.clone(), id, "NatGateway");
    if let Some(name) = tags.get("Name") {
        record = record.with_name(name);
    }
    if let Some(state) = state {
        record = record.with_state(state);
    }
    if let Some(created) = nat.create_time().and_then(to_chrono) {
        record = record.with_created_at(created);
    }
    record = record.with_tags(tags);

    if let Some(vpc) = nat.vpc_id() {
        record = record.with_attribute("vpc_id", vpc);
    }
    if let Some(subnet) = nat.subnet_id() {
        record = record.with_attribute("subnet_id", subnet);
    }
    if let Some(connectivity) = nat.connectivity_type() {
        record = record.with_attribute("connectivity_type", connectivity.as_str());
    }

    Some(record)
}

fn to_chrono(dt: &aws_sdk_ec2::primitives::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}
