//! Report rendering.

use cs_cli_common::format_cost;
use cs_types::{ResourceRecord, ScanResult};
use std::fmt::Write;

/// How many attribute details each table row shows.
const MAX_DETAILS: usize = 3;

/// Render the result as pretty-printed JSON.
pub fn render_json(result: &ScanResult) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Render the result as a markdown report.
///
/// Sections: header with totals, summary-by-service table, per-service
/// per-region detail tables, the top-10 cost breakdown, and failed scan
/// tasks. Input records are already sorted, so the output is
/// deterministic.
pub fn render_markdown(result: &ScanResult) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Cloud Resources Report");
    let _ = writeln!(out);
    let _ = writeln!(out, "**Generated:** {}", result.completed_at.to_rfc3339());
    let _ = writeln!(
        out,
        "**Total Resources Found:** {}",
        result.summary.total_resources
    );
    let _ = writeln!(
        out,
        "**Total Estimated Monthly Cost:** {}",
        format_cost(result.summary.total_monthly_cost)
    );
    let _ = writeln!(out);

    if result.records.is_empty() && result.errors.is_empty() {
        let _ = writeln!(out, "No resources found.");
        return out;
    }

    let _ = writeln!(out, "## Summary by Service");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Service | Resource Count | Estimated Monthly Cost |");
    let _ = writeln!(out, "|---------|----------------|------------------------|");
    for (service, summary) in &result.summary.services {
        let _ = writeln!(
            out,
            "| {} | {} | {} |",
            service,
            summary.resources,
            format_cost(summary.monthly_cost)
        );
    }
    let _ = writeln!(out);

    render_details(&mut out, result);
    render_top_costs(&mut out, result);
    render_failures(&mut out, result);

    out
}

fn render_details(out: &mut String, result: &ScanResult) {
    // Records are sorted by (service, region, id); walk the group
    // boundaries and emit headers as they change.
    let mut current_service: Option<&str> = None;
    let mut current_region: Option<&str> = None;

    for record in &result.records {
        if current_service != Some(record.service.as_str()) {
            current_service = Some(record.service.as_str());
            current_region = None;
            let _ = writeln!(out, "## {}", record.service);
            let _ = writeln!(out);
        }
        if current_region != Some(record.region.as_str()) {
            current_region = Some(record.region.as_str());
            let _ = writeln!(out, "### {}", record.region);
            let _ = writeln!(out);
            let _ = writeln!(out, "| Type | Name/ID | State | Monthly Cost | Details |");
            let _ = writeln!(out, "|------|---------|-------|--------------|---------|");
        }

        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            record.resource_type,
            record.display_name(),
            record.state.as_deref().unwrap_or("-"),
            cost_cell(record),
            details_cell(record),
        );
    }
    if !result.records.is_empty() {
        let _ = writeln!(out);
    }
}

fn render_top_costs(out: &mut String, result: &ScanResult) {
    if result.top_costs.is_empty() {
        return;
    }

    let _ = writeln!(out, "## Cost Breakdown");
    let _ = writeln!(out);
    let _ = writeln!(out, "### Top 10 Most Expensive Resources");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Service | Type | Name/ID | Region | Monthly Cost |");
    let _ = writeln!(out, "|---------|------|---------|--------|--------------|");
    for record in &result.top_costs {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            record.service,
            record.resource_type,
            record.display_name(),
            record.region,
            cost_cell(record),
        );
    }
    let _ = writeln!(out);
}

fn render_failures(out: &mut String, result: &ScanResult) {
    if result.errors.is_empty() {
        return;
    }

    let _ = writeln!(out, "## Failed Scans");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Service | Region | Error | Retryable | Attempts |");
    let _ = writeln!(out, "|---------|--------|-------|-----------|----------|");
    for error in &result.errors {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            error.service,
            error.region,
            error.kind,
            if error.retryable { "yes" } else { "no" },
            error.attempts,
        );
    }
    let _ = writeln!(out);
}

fn cost_cell(record: &ResourceRecord) -> String {
    match record.monthly_cost {
        Some(cost) => format_cost(cost),
        None => "-".to_string(),
    }
}

fn details_cell(record: &ResourceRecord) -> String {
    let details: Vec<String> = record
        .attributes
        .iter()
        .take(MAX_DETAILS)
        .map(|(k, v)| format!("{k}: {v}"))
        .collect();
    if details.is_empty() {
        "-".to_string()
    } else {
        details.join(", ")
    }
}
