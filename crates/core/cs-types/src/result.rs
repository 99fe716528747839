//! Scan outputs: the orchestrator's raw collection and the final report.

use crate::record::{ResourceRecord, ScanError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unsorted output of one orchestrator run.
///
/// Records are in completion order, which varies between runs. Ordering
/// and summarization are imposed by the report aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawScanOutput {
    /// All resources found by successful tasks
    pub records: Vec<ResourceRecord>,

    /// One entry per failed task
    pub errors: Vec<ScanError>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the last task completed
    pub completed_at: DateTime<Utc>,
}

impl RawScanOutput {
    pub fn elapsed(&self) -> Duration {
        self.completed_at - self.started_at
    }
}

/// The final aggregated scan result.
///
/// Records are sorted by (service, region, id); summaries use BTreeMaps.
/// Given the same raw input, two results are byte-for-byte identical apart
/// from the timestamps carried over from the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// All resources, deterministically ordered, with costs applied
    pub records: Vec<ResourceRecord>,

    /// Failed tasks, sorted by (service, region)
    pub errors: Vec<ScanError>,

    /// Counts and cost totals by service and region
    pub summary: ScanSummary,

    /// The ten highest-cost records, cost descending, id ascending on ties
    pub top_costs: Vec<ResourceRecord>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run completed
    pub completed_at: DateTime<Utc>,
}

impl ScanResult {
    pub fn elapsed(&self) -> Duration {
        self.completed_at - self.started_at
    }
}

/// Grand totals plus a per-service breakdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Total resources found
    pub total_resources: usize,

    /// Resources with a defined cost estimate
    pub priced_resources: usize,

    /// Resources the pricing table had no entry for
    pub unpriced_resources: usize,

    /// Sum of all defined cost estimates in USD
    pub total_monthly_cost: f64,

    /// Per-service summaries, keyed by service name
    pub services: BTreeMap<String, ServiceSummary>,
}

/// Counts and cost subtotal for one service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub resources: usize,
    pub monthly_cost: f64,
    /// Per-region breakdown within this service
    pub regions: BTreeMap<String, RegionSummary>,
}

/// Counts and cost subtotal for one region within a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub resources: usize,
    pub monthly_cost: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Region;

    #[test]
    fn test_raw_output_elapsed() {
        let start = Utc::now();
        let raw = RawScanOutput {
            records: vec![],
            errors: vec![],
            started_at: start,
            completed_at: start + Duration::seconds(3),
        };
        assert_eq!(raw.elapsed().num_seconds(), 3);
    }

    #[test]
    fn test_summary_serialization_is_ordered() {
        let mut summary = ScanSummary::default();
        summary.services.insert(
            "S3".to_string(),
            ServiceSummary {
                resources: 1,
                monthly_cost: 0.0,
                regions: BTreeMap::new(),
            },
        );
        summary.services.insert(
            "EC2".to_string(),
            ServiceSummary {
                resources: 2,
                monthly_cost: 15.0,
                regions: BTreeMap::new(),
            },
        );

        let json = serde_json::to_string(&summary).unwrap();
        // BTreeMap serializes keys in sorted order
        assert!(json.find("EC2").unwrap() < json.find("S3").unwrap());
    }

    #[test]
    fn test_scan_result_roundtrip() {
        let now = Utc::now();
        let result = ScanResult {
            records: vec![ResourceRecord::new(
                "EC2",
                Region::from("us-east-1"),
                "i-1",
                "Instance",
            )],
            errors: vec![],
            summary: ScanSummary::default(),
            top_costs: vec![],
            started_at: now,
            completed_at: now,
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: ScanResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }
}
