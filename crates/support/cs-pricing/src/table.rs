//! The static pricing table.

use cs_types::ResourceRecord;
use std::collections::BTreeMap;

/// Snapshot storage per GB per month.
const SNAPSHOT_PER_GB: f64 = 0.05;

/// An Elastic IP held but not attached to a running instance.
const UNATTACHED_ELASTIC_IP: f64 = 3.60;

/// A NAT gateway in the `available` state.
const NAT_GATEWAY_MONTHLY: f64 = 45.00;

/// RDS allocated storage per GB per month (gp2 baseline).
const RDS_STORAGE_PER_GB: f64 = 0.115;

/// Application and network load balancers.
const LOAD_BALANCER_MONTHLY: f64 = 23.00;

/// Classic load balancers.
const CLASSIC_LOAD_BALANCER_MONTHLY: f64 = 25.00;

/// An EKS control plane ($0.10/hour).
const EKS_CLUSTER_MONTHLY: f64 = 73.00;

/// Monthly cost estimates keyed by resource type and attributes.
///
/// Unknown instance types, volume types and instance classes estimate as
/// `None`; the report layer counts those separately instead of guessing.
#[derive(Debug, Clone)]
pub struct PricingTable {
    instances: BTreeMap<&'static str, f64>,
    ebs_per_gb: BTreeMap<&'static str, f64>,
    rds_instances: BTreeMap<&'static str, f64>,
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PricingTable {
    /// The built-in table.
    pub fn builtin() -> Self {
        let instances = BTreeMap::from([
            ("t2.nano", 4.25),
            ("t2.micro", 8.50),
            ("t2.small", 17.00),
            ("t2.medium", 34.00),
            ("t2.large", 68.00),
            ("t2.xlarge", 136.00),
            ("t2.2xlarge", 272.00),
            ("t3.nano", 3.80),
            ("t3.micro", 7.50),
            ("t3.small", 15.00),
            ("t3.medium", 30.00),
            ("t3.large", 60.00),
            ("t3.xlarge", 120.00),
            ("t3.2xlarge", 240.00),
            ("m5.large", 70.00),
            ("m5.xlarge", 140.00),
            ("m5.2xlarge", 280.00),
            ("m5.4xlarge", 560.00),
            ("m5.8xlarge", 1120.00),
            ("c5.large", 62.00),
            ("c5.xlarge", 124.00),
            ("c5.2xlarge", 248.00),
            ("c5.4xlarge", 496.00),
            ("r5.large", 92.00),
            ("r5.xlarge", 184.00),
            ("r5.2xlarge", 368.00),
            ("r5.4xlarge", 736.00),
        ]);

        let ebs_per_gb = BTreeMap::from([
            ("gp3", 0.08),
            ("gp2", 0.10),
            ("io1", 0.125),
            ("io2", 0.125),
            ("st1", 0.045),
            ("sc1", 0.025),
            ("standard", 0.05),
        ]);

        let rds_instances = BTreeMap::from([
            ("db.t3.micro", 13.00),
            ("db.t3.small", 26.00),
            ("db.t3.medium", 52.00),
            ("db.t3.large", 104.00),
            ("db.m5.large", 125.00),
            ("db.m5.xlarge", 250.00),
            ("db.m5.2xlarge", 500.00),
            ("db.r5.large", 180.00),
            ("db.r5.xlarge", 360.00),
        ]);

        Self {
            instances,
            ebs_per_gb,
            rds_instances,
        }
    }

    /// Estimate a record's monthly cost in USD.
    ///
    /// `None` means the table has no basis for an estimate; `Some(0.0)` is
    /// a real estimate for resources that exist but do not accrue cost in
    /// their current state (stopped instances, attached Elastic IPs).
    pub fn estimate(&self, record: &ResourceRecord) -> Option<f64> {
        match record.resource_type.as_str() {
            "Instance" => self.estimate_instance(record),
            "Volume" => self.estimate_volume(record),
            "Snapshot" => gb_attribute(record, "size_gb").map(|gb| gb * SNAPSHOT_PER_GB),
            "ElasticIp" => Some(self.estimate_elastic_ip(record)),
            "NatGateway" => Some(state_gated(record, "available", NAT_GATEWAY_MONTHLY)),
            "DBInstance" => self.estimate_db_instance(record),
            "LoadBalancer" => Some(self.estimate_load_balancer(record)),
            "EksCluster" => Some(state_gated(record, "ACTIVE", EKS_CLUSTER_MONTHLY)),
            _ => None,
        }
    }

    fn estimate_instance(&self, record: &ResourceRecord) -> Option<f64> {
        if record.state.as_deref() != Some("running") {
            return Some(0.0);
        }
        let instance_type = record.attribute("instance_type")?;
        self.instances.get(instance_type).copied()
    }

    fn estimate_volume(&self, record: &ResourceRecord) -> Option<f64> {
        let volume_type = record.attribute("volume_type")?;
        let per_gb = self.ebs_per_gb.get(volume_type)?;
        Some(per_gb * gb_attribute(record, "size_gb")?)
    }

    fn estimate_elastic_ip(&self, record: &ResourceRecord) -> f64 {
        if record.attribute("attached") == Some("true") {
            0.0
        } else {
            UNATTACHED_ELASTIC_IP
        }
    }

    fn estimate_db_instance(&self, record: &ResourceRecord) -> Option<f64> {
        if record.state.as_deref() != Some("available") {
            return Some(0.0);
        }
        let instance_class = record.attribute("instance_class")?;
        let base = self.rds_instances.get(instance_class)?;
        let storage = gb_attribute(record, "allocated_storage_gb")
            .map(|gb| gb * RDS_STORAGE_PER_GB)
            .unwrap_or(0.0);
        Some(base + storage)
    }

    fn estimate_load_balancer(&self, record: &ResourceRecord) -> f64 {
        if record.state.as_deref() == Some("active") || record.state.is_none() {
            if record.attribute("lb_type") == Some("classic") {
                CLASSIC_LOAD_BALANCER_MONTHLY
            } else {
                LOAD_BALANCER_MONTHLY
            }
        } else {
            0.0
        }
    }
}

/// Parse a numeric GB attribute.
fn gb_attribute(record: &ResourceRecord, key: &str) -> Option<f64> {
    record.attribute(key)?.parse::<f64>().ok()
}

/// The flat estimate when the record's state matches, zero otherwise.
fn state_gated(record: &ResourceRecord, active_state: &str, monthly: f64) -> f64 {
    if record.state.as_deref() == Some(active_state) {
        monthly
    } else {
        0.0
    }
}
