//! CLI argument definitions for cloudscan.

use clap::{Parser, ValueEnum};
use cs_cli_common::LogLevel;
use cs_orchestrator::ScanConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Cross-region cloud resource scanner.
///
/// Inventories EC2 and S3 resources across the account's regions,
/// estimates recurring monthly cost, and renders an aggregated report.
/// All operations are read-only.
///
/// ## Examples
///
/// Scan everything:
///   cloudscan
///
/// Scan two regions, EC2 only, as JSON:
///   cloudscan --regions us-east-1,eu-west-1 --services EC2 --format json
///
/// Against LocalStack:
///   cloudscan --endpoint http://localhost:4566 --regions us-east-1
#[derive(Parser, Debug)]
#[command(name = "cloudscan")]
#[command(version, about, long_about = None)]
pub struct Cli {
    // === Scope ===
    /// Regions to scan (comma-separated; default: all enabled regions)
    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    /// Regions to exclude
    #[arg(long, value_delimiter = ',')]
    pub skip_regions: Vec<String>,

    /// Services to scan (comma-separated; default: all registered)
    #[arg(long, value_delimiter = ',')]
    pub services: Vec<String>,

    /// Services to exclude
    #[arg(long, value_delimiter = ',')]
    pub skip_services: Vec<String>,

    // === Concurrency ===
    /// Maximum regions scanned concurrently (must be >= 1)
    #[arg(long, default_value = "8", value_parser = parse_positive_usize)]
    pub max_concurrent_regions: usize,

    /// Maximum services scanned concurrently per region (must be >= 1)
    #[arg(long, default_value = "4", value_parser = parse_positive_usize)]
    pub max_concurrent_services: usize,

    // === Rate limiting and retries ===
    /// Per-service API request rate (tokens per second)
    #[arg(long, default_value = "10.0")]
    pub requests_per_second: f64,

    /// Retries after the initial attempt of each API call
    #[arg(long, default_value = "3")]
    pub max_retries: u32,

    /// Backoff delay before the first retry, in milliseconds
    #[arg(long, default_value = "1000")]
    pub base_delay_ms: u64,

    /// Backoff multiplier applied per retry
    #[arg(long, default_value = "2.0")]
    pub backoff_multiplier: f64,

    /// Fraction of each backoff randomized as jitter, in [0, 1]
    #[arg(long, default_value = "0.25")]
    pub jitter_fraction: f64,

    /// Deadline for one (region, service) task, in seconds
    #[arg(long, default_value = "120")]
    pub task_deadline_secs: u64,

    /// Item cap per task; enumeration beyond this is sampled
    #[arg(long, default_value = "10000")]
    pub max_items_per_task: usize,

    // === AWS ===
    /// AWS region for region discovery and global services
    #[arg(long, env = "AWS_REGION")]
    pub aws_region: Option<String>,

    /// Custom AWS endpoint URL (for LocalStack)
    #[arg(long, env = "CS_AWS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// AWS profile name
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    // === Output ===
    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "markdown")]
    pub format: OutputFormat,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,
}

impl Cli {
    /// Build the orchestrator configuration from the parsed arguments.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::new()
            .with_max_concurrent_regions(self.max_concurrent_regions)
            .with_max_concurrent_services(self.max_concurrent_services)
            .with_only_regions(self.regions.iter().cloned())
            .with_skip_regions(self.skip_regions.iter().cloned())
            .with_only_services(self.services.iter().cloned())
            .with_skip_services(self.skip_services.iter().cloned())
            .with_requests_per_second(self.requests_per_second)
            .with_max_retries(self.max_retries)
            .with_base_delay(Duration::from_millis(self.base_delay_ms))
            .with_backoff_multiplier(self.backoff_multiplier)
            .with_jitter_fraction(self.jitter_fraction)
            .with_task_deadline(Duration::from_secs(self.task_deadline_secs))
            .with_max_items_per_task(self.max_items_per_task)
    }
}

/// Report format argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Markdown report
    Markdown,
    /// Pretty-printed JSON
    Json,
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}
