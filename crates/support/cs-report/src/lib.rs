//! Deterministic aggregation of raw scan output into the final report.
//!
//! The orchestrator emits records in completion order, which varies
//! between runs. Aggregation imposes a total order, applies the pricing
//! table, and builds the summaries, so two runs over the same resources
//! produce identical results apart from timestamps.

use cs_pricing::PricingTable;
use cs_types::{
    RawScanOutput, RegionSummary, ResourceRecord, ScanResult, ScanSummary, ServiceSummary,
};
use tracing::debug;

/// How many records the top-cost list holds.
const TOP_COSTS: usize = 10;

/// Aggregate a raw scan into the final [`ScanResult`].
///
/// Applies cost estimates, sorts records by (service, region, id) and
/// errors by (service, region), builds per-service and per-region
/// summaries, and selects the highest-cost records. Totals sum only
/// defined estimates; records the table cannot price are counted in
/// `unpriced_resources` and excluded from every cost figure.
pub fn aggregate(raw: RawScanOutput, pricing: &PricingTable) -> ScanResult {
    let mut records = raw.records;
    for record in &mut records {
        record.monthly_cost = pricing.estimate(record);
    }
    records.sort_by(|a, b| {
        (&a.service, &a.region, &a.id).cmp(&(&b.service, &b.region, &b.id))
    });

    let mut errors = raw.errors;
    errors.sort_by(|a, b| (&a.service, &a.region).cmp(&(&b.service, &b.region)));

    let summary = summarize(&records);
    let top_costs = top_costs(&records);

    debug!(
        resources = summary.total_resources,
        unpriced = summary.unpriced_resources,
        total_monthly_cost = summary.total_monthly_cost,
        errors = errors.len(),
        "Aggregated scan result"
    );

    ScanResult {
        records,
        errors,
        summary,
        top_costs,
        started_at: raw.started_at,
        completed_at: raw.completed_at,
    }
}

fn summarize(records: &[ResourceRecord]) -> ScanSummary {
    let mut summary = ScanSummary {
        total_resources: records.len(),
        ..Default::default()
    };

    for record in records {
        let service = summary
            .services
            .entry(record.service.clone())
            .or_insert_with(ServiceSummary::default);
        service.resources += 1;

        let region = service
            .regions
            .entry(record.region.as_str().to_string())
            .or_insert_with(RegionSummary::default);
        region.resources += 1;

        match record.monthly_cost {
            Some(cost) => {
                summary.priced_resources += 1;
                summary.total_monthly_cost += cost;
                service.monthly_cost += cost;
                region.monthly_cost += cost;
            }
            None => summary.unpriced_resources += 1,
        }
    }

    summary
}

/// The [`TOP_COSTS`] highest-cost records, cost descending, id ascending
/// on ties. Unpriced and zero-cost records never appear.
fn top_costs(records: &[ResourceRecord]) -> Vec<ResourceRecord> {
    let mut priced: Vec<&ResourceRecord> = records
        .iter()
        .filter(|r| r.monthly_cost.is_some_and(|c| c > 0.0))
        .collect();

    priced.sort_by(|a, b| {
        let a_cost = a.monthly_cost.unwrap_or(0.0);
        let b_cost = b.monthly_cost.unwrap_or(0.0);
        b_cost.total_cmp(&a_cost).then_with(|| a.id.cmp(&b.id))
    });

    priced.into_iter().take(TOP_COSTS).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cs_types::Region;

    fn instance(region: &str, id: &str, instance_type: &str) -> ResourceRecord {
        ResourceRecord::new("EC2", Region::from(region), id, "Instance")
            .with_state("running")
            .with_attribute("instance_type", instance_type)
    }

    fn raw(records: Vec<ResourceRecord>) -> RawScanOutput {
        let now = Utc::now();
        RawScanOutput {
            records,
            errors: vec![],
            started_at: now,
            completed_at: now,
        }
    }

    #[test]
    fn test_records_sorted_by_service_region_id() {
        let result = aggregate(
            raw(vec![
                instance("us-west-2", "i-b", "t3.micro"),
                ResourceRecord::new("S3", Region::from("us-east-1"), "bucket-1", "Bucket"),
                instance("us-east-1", "i-c", "t3.micro"),
                instance("us-east-1", "i-a", "t3.micro"),
            ]),
            &PricingTable::builtin(),
        );

        let keys: Vec<(&str, &str, &str)> = result
            .records
            .iter()
            .map(|r| (r.service.as_str(), r.region.as_str(), r.id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("EC2", "us-east-1", "i-a"),
                ("EC2", "us-east-1", "i-c"),
                ("EC2", "us-west-2", "i-b"),
                ("S3", "us-east-1", "bucket-1"),
            ]
        );
    }

    #[test]
    fn test_cost_sum_identity() {
        let result = aggregate(
            raw(vec![
                instance("us-east-1", "i-1", "t3.medium"),
                instance("us-east-1", "i-2", "m5.large"),
                instance("eu-west-1", "i-3", "t3.micro"),
                // Unpriced; must not contribute to any total
                ResourceRecord::new("S3", Region::from("us-east-1"), "bucket-1", "Bucket"),
            ]),
            &PricingTable::builtin(),
        );

        let record_sum: f64 = result
            .records
            .iter()
            .filter_map(|r| r.monthly_cost)
            .sum();
        assert!((result.summary.total_monthly_cost - record_sum).abs() < 1e-9);
        assert!((record_sum - 107.5).abs() < 1e-9);
        assert_eq!(result.summary.priced_resources, 3);
        assert_eq!(result.summary.unpriced_resources, 1);
    }

    #[test]
    fn test_grouping_partitions_the_records() {
        let result = aggregate(
            raw(vec![
                instance("us-east-1", "i-1", "t3.micro"),
                instance("us-west-2", "i-2", "t3.micro"),
                instance("us-west-2", "i-3", "t3.micro"),
                ResourceRecord::new("S3", Region::from("us-east-1"), "bucket-1", "Bucket"),
            ]),
            &PricingTable::builtin(),
        );

        let service_total: usize = result.summary.services.values().map(|s| s.resources).sum();
        assert_eq!(service_total, result.summary.total_resources);

        let ec2 = &result.summary.services["EC2"];
        let region_total: usize = ec2.regions.values().map(|r| r.resources).sum();
        assert_eq!(region_total, ec2.resources);
        assert_eq!(ec2.regions["us-west-2"].resources, 2);
    }

    #[test]
    fn test_top_costs_order_and_truncation() {
        let mut records: Vec<ResourceRecord> = (0..12)
            .map(|i| instance("us-east-1", &format!("i-{i:02}"), "m5.xlarge"))
            .collect();
        // Two standouts and a tie pair
        records.push(instance("us-east-1", "i-big", "m5.8xlarge"));
        records.push(instance("us-east-1", "i-zz", "m5.4xlarge"));
        records.push(instance("us-east-1", "i-aa", "m5.4xlarge"));

        let result = aggregate(raw(records), &PricingTable::builtin());

        assert_eq!(result.top_costs.len(), 10);
        assert_eq!(result.top_costs[0].id, "i-big");
        // Equal costs tie-break by id ascending
        assert_eq!(result.top_costs[1].id, "i-aa");
        assert_eq!(result.top_costs[2].id, "i-zz");
        let costs: Vec<f64> = result
            .top_costs
            .iter()
            .filter_map(|r| r.monthly_cost)
            .collect();
        assert!(costs.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_top_costs_exclude_zero_and_unpriced() {
        let result = aggregate(
            raw(vec![
                instance("us-east-1", "i-1", "t3.micro"),
                ResourceRecord::new("EC2", Region::from("us-east-1"), "i-stopped", "Instance")
                    .with_state("stopped")
                    .with_attribute("instance_type", "m5.8xlarge"),
                ResourceRecord::new("S3", Region::from("us-east-1"), "bucket-1", "Bucket"),
            ]),
            &PricingTable::builtin(),
        );

        assert_eq!(result.top_costs.len(), 1);
        assert_eq!(result.top_costs[0].id, "i-1");
    }

    #[test]
    fn test_deterministic_given_shuffled_input() {
        let forward = vec![
            instance("us-east-1", "i-1", "t3.micro"),
            instance("eu-west-1", "i-2", "m5.large"),
            instance("ap-south-1", "i-3", "c5.xlarge"),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let now = Utc::now();
        let make_raw = |records| RawScanOutput {
            records,
            errors: vec![],
            started_at: now,
            completed_at: now,
        };

        let a = aggregate(make_raw(forward), &PricingTable::builtin());
        let b = aggregate(make_raw(reversed), &PricingTable::builtin());

        assert_eq!(
            serde_json::to_string(&a.records).unwrap(),
            serde_json::to_string(&b.records).unwrap()
        );
        assert_eq!(a.summary, b.summary);
    }

    #[test]
    fn test_errors_sorted() {
        let now = Utc::now();
        let error = |service: &str, region: &str| cs_types::ScanError {
            service: service.to_string(),
            region: Region::from(region),
            kind: cs_types::ErrorKind::Auth,
            message: "AccessDenied".to_string(),
            retryable: false,
            attempts: 1,
        };

        let result = aggregate(
            RawScanOutput {
                records: vec![],
                errors: vec![
                    error("S3", "us-east-1"),
                    error("EC2", "us-west-2"),
                    error("EC2", "eu-west-1"),
                ],
                started_at: now,
                completed_at: now,
            },
            &PricingTable::builtin(),
        );

        let keys: Vec<(&str, &str)> = result
            .errors
            .iter()
            .map(|e| (e.service.as_str(), e.region.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("EC2", "eu-west-1"),
                ("EC2", "us-west-2"),
                ("S3", "us-east-1"),
            ]
        );
    }
}
