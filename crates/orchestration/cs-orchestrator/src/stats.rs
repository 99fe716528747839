//! Statistics for scan runs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by concurrent scan tasks.
///
/// Plain atomics with relaxed ordering; exact interleaving does not
/// matter, only the final totals.
#[derive(Debug, Default)]
pub struct ScanStats {
    started_at: Option<DateTime<Utc>>,

    /// Tasks that completed and contributed records (possibly zero)
    tasks_succeeded: AtomicU64,

    /// Tasks recorded as a scan error
    tasks_failed: AtomicU64,

    /// Tasks never dispatched because the run was cancelled
    tasks_skipped: AtomicU64,

    /// Resources found across all successful tasks
    resources_found: AtomicU64,

    /// API invocations made, retries included
    api_calls: AtomicU64,

    /// Tasks whose enumeration hit the item cap
    tasks_truncated: AtomicU64,
}

impl ScanStats {
    /// Create a stats tracker with the current time as start time.
    pub fn new() -> Self {
        Self {
            started_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    pub fn record_task_success(&self, resources: u64, calls: u64, truncated: bool) {
        self.tasks_succeeded.fetch_add(1, Ordering::Relaxed);
        self.resources_found.fetch_add(resources, Ordering::Relaxed);
        self.api_calls.fetch_add(calls, Ordering::Relaxed);
        if truncated {
            self.tasks_truncated.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_task_failure(&self, calls: u64) {
        self.tasks_failed.fetch_add(1, Ordering::Relaxed);
        self.api_calls.fetch_add(calls, Ordering::Relaxed);
    }

    pub fn record_task_skipped(&self) {
        self.tasks_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tasks_succeeded(&self) -> u64 {
        self.tasks_succeeded.load(Ordering::Relaxed)
    }

    pub fn tasks_failed(&self) -> u64 {
        self.tasks_failed.load(Ordering::Relaxed)
    }

    pub fn tasks_skipped(&self) -> u64 {
        self.tasks_skipped.load(Ordering::Relaxed)
    }

    pub fn resources_found(&self) -> u64 {
        self.resources_found.load(Ordering::Relaxed)
    }

    pub fn api_calls(&self) -> u64 {
        self.api_calls.load(Ordering::Relaxed)
    }

    pub fn tasks_truncated(&self) -> u64 {
        self.tasks_truncated.load(Ordering::Relaxed)
    }

    /// Create a snapshot of the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            started_at: self.started_at,
            completed_at: None,
            tasks_succeeded: self.tasks_succeeded(),
            tasks_failed: self.tasks_failed(),
            tasks_skipped: self.tasks_skipped(),
            resources_found: self.resources_found(),
            api_calls: self.api_calls(),
            tasks_truncated: self.tasks_truncated(),
        }
    }
}

/// A serializable snapshot of scan statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub tasks_succeeded: u64,
    pub tasks_failed: u64,
    pub tasks_skipped: u64,
    pub resources_found: u64,
    pub api_calls: u64,
    pub tasks_truncated: u64,
}

impl StatsSnapshot {
    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
