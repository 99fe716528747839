//! Configuration types for the scan orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Default per-task item cap for sampled resource kinds.
pub const DEFAULT_MAX_ITEMS_PER_TASK: usize = 10_000;

/// Configuration for one scan run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Maximum regions scanned concurrently (outer bound)
    pub max_concurrent_regions: usize,

    /// Maximum services scanned concurrently within one active region
    /// (inner bound)
    pub max_concurrent_services: usize,

    /// Regions excluded from the run
    pub skip_regions: BTreeSet<String>,

    /// Services excluded from the run
    pub skip_services: BTreeSet<String>,

    /// When non-empty, only these regions are scanned
    pub only_regions: BTreeSet<String>,

    /// When non-empty, only these services are scanned
    pub only_services: BTreeSet<String>,

    /// Token refill rate of each per-service bucket
    pub requests_per_second: f64,

    /// Bucket capacity; defaults to `requests_per_second` rounded up
    pub burst: Option<usize>,

    /// Retries after the initial attempt of each call
    pub max_retries: u32,

    /// Backoff delay before the first retry
    #[serde(with = "duration_secs")]
    pub base_delay: Duration,

    /// Multiplier applied to the delay after each retry
    pub backoff_multiplier: f64,

    /// Fraction of the computed delay randomized as jitter, in [0, 1]
    pub jitter_fraction: f64,

    /// Deadline for one (region, service) task
    #[serde(with = "duration_secs")]
    pub task_deadline: Duration,

    /// Item cap per task; enumeration beyond this is sampled
    pub max_items_per_task: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_regions: 8,
            max_concurrent_services: 4,
            skip_regions: BTreeSet::new(),
            skip_services: BTreeSet::new(),
            only_regions: BTreeSet::new(),
            only_services: BTreeSet::new(),
            requests_per_second: 10.0,
            burst: None,
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            jitter_fraction: 0.25,
            task_deadline: Duration::from_secs(120),
            max_items_per_task: DEFAULT_MAX_ITEMS_PER_TASK,
        }
    }
}

impl ScanConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum concurrently active regions.
    pub fn with_max_concurrent_regions(mut self, max: usize) -> Self {
        self.max_concurrent_regions = max;
        self
    }

    /// Set the maximum concurrently active services per region.
    pub fn with_max_concurrent_services(mut self, max: usize) -> Self {
        self.max_concurrent_services = max;
        self
    }

    /// Set the regions to skip.
    pub fn with_skip_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_regions = regions.into_iter().map(Into::into).collect();
        self
    }

    /// Set the services to skip.
    pub fn with_skip_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_services = services.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the run to the given regions.
    pub fn with_only_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_regions = regions.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the run to the given services.
    pub fn with_only_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_services = services.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-service request rate.
    pub fn with_requests_per_second(mut self, rate: f64) -> Self {
        self.requests_per_second = rate;
        self
    }

    /// Set the token bucket capacity.
    pub fn with_burst(mut self, burst: usize) -> Self {
        self.burst = Some(burst);
        self
    }

    /// Set the retry count.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the base backoff delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Set the jitter fraction.
    pub fn with_jitter_fraction(mut self, fraction: f64) -> Self {
        self.jitter_fraction = fraction;
        self
    }

    /// Set the per-task deadline.
    pub fn with_task_deadline(mut self, deadline: Duration) -> Self {
        self.task_deadline = deadline;
        self
    }

    /// Set the per-task item cap.
    pub fn with_max_items_per_task(mut self, cap: usize) -> Self {
        self.max_items_per_task = cap;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_regions == 0 {
            return Err("max_concurrent_regions must be at least 1".to_string());
        }
        if self.max_concurrent_services == 0 {
            return Err("max_concurrent_services must be at least 1".to_string());
        }
        if self.requests_per_second <= 0.0 {
            return Err("requests_per_second must be positive".to_string());
        }
        if self.backoff_multiplier < 1.0 {
            return Err("backoff_multiplier must be at least 1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.jitter_fraction) {
            return Err("jitter_fraction must be within [0, 1]".to_string());
        }
        if self.task_deadline.is_zero() {
            return Err("task_deadline must be positive".to_string());
        }
        if self.max_items_per_task == 0 {
            return Err("max_items_per_task must be at least 1".to_string());
        }
        Ok(())
    }

    /// Apply the skip/only region filters.
    pub fn filter_regions<'a>(&self, regions: &'a [cs_types::Region]) -> Vec<&'a cs_types::Region> {
        regions
            .iter()
            .filter(|r| !self.skip_regions.contains(r.as_str()))
            .filter(|r| self.only_regions.is_empty() || self.only_regions.contains(r.as_str()))
            .collect()
    }

    /// Whether a service passes the skip/only filters.
    pub fn service_enabled(&self, name: &str) -> bool {
        if self.skip_services.contains(name) {
            return false;
        }
        self.only_services.is_empty() || self.only_services.contains(name)
    }
}

/// Serde helper for Duration serialization as integer seconds.
mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
