//! The scan orchestrator.

use crate::cancel::CancelFlag;
use crate::config::ScanConfig;
use crate::paginate::drain_pages;
use crate::rate_limit::TokenBucket;
use crate::retry::RetryPolicy;
use crate::stats::ScanStats;
use chrono::Utc;
use cs_error::{CsError, Result};
use cs_traits::ServiceDescriptor;
use cs_types::{RawScanOutput, Region, ResourceRecord, ScanError};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Schedules one task per (region, service) pair and collects the raw
/// result set.
///
/// Concurrency is bounded twice: a semaphore caps the number of regions
/// being scanned at once, and within each active region the service tasks
/// run through a bounded `buffer_unordered`. Partial failure is normal
/// operation; a failed task becomes a [`ScanError`] in the output and
/// never stops its siblings.
pub struct Orchestrator {
    config: ScanConfig,
    services: Vec<ServiceDescriptor>,
    stats: Arc<ScanStats>,
    cancel: CancelFlag,
}

/// What one dispatched task produced.
enum TaskOutcome {
    /// Zero or more records from a completed enumeration
    Success(Vec<ResourceRecord>),

    /// Exactly one recorded error
    Failed(ScanError),

    /// Never dispatched; the run was cancelled first
    Skipped,
}

impl Orchestrator {
    /// Create an orchestrator for one run.
    ///
    /// Fails with a config error when the configuration is invalid or no
    /// services are registered.
    pub fn new(config: ScanConfig, services: Vec<ServiceDescriptor>) -> Result<Self> {
        config.validate().map_err(CsError::Config)?;
        if services.is_empty() {
            return Err(CsError::Config("no services registered".to_string()));
        }

        Ok(Self {
            config,
            services,
            stats: Arc::new(ScanStats::new()),
            cancel: CancelFlag::new(),
        })
    }

    /// Handle for run-level cancellation.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// The run's statistics counters.
    pub fn stats(&self) -> &Arc<ScanStats> {
        &self.stats
    }

    /// Scan all filtered (region, service) pairs.
    ///
    /// Returns the unsorted union of records plus one error per failed
    /// task. Fails before dispatch when the filtered region or service
    /// set is empty, and after the run when tasks were attempted and none
    /// succeeded.
    pub async fn scan(&self, regions: &[Region]) -> Result<RawScanOutput> {
        let regions: Vec<Region> = self
            .config
            .filter_regions(regions)
            .into_iter()
            .cloned()
            .collect();
        if regions.is_empty() {
            return Err(CsError::Config(
                "no regions left after filtering".to_string(),
            ));
        }

        let services: Vec<ServiceDescriptor> = self
            .services
            .iter()
            .filter(|s| self.config.service_enabled(&s.name))
            .cloned()
            .collect();
        if services.is_empty() {
            return Err(CsError::Config(
                "no services left after filtering".to_string(),
            ));
        }

        // One bucket per service, shared by every region's task
        let limiters: HashMap<String, Arc<TokenBucket>> = services
            .iter()
            .map(|s| {
                (
                    s.name.clone(),
                    Arc::new(TokenBucket::new(
                        self.config.requests_per_second,
                        self.config.burst,
                    )),
                )
            })
            .collect();

        let retry = Arc::new(RetryPolicy::from_config(&self.config));
        let region_sem = Arc::new(Semaphore::new(self.config.max_concurrent_regions));
        let started_at = Utc::now();

        info!(
            regions = regions.len(),
            services = services.len(),
            tasks = regions.len() * services.len(),
            "Starting scan"
        );

        let region_futures = regions.iter().map(|region| {
            let region = region.clone();
            let services = services.clone();
            let limiters = limiters.clone();
            let retry = retry.clone();
            let region_sem = region_sem.clone();
            let cancel = self.cancel.clone();
            let stats = self.stats.clone();
            let task_deadline = self.config.task_deadline;
            let max_items = self.config.max_items_per_task;
            let max_concurrent_services = self.config.max_concurrent_services;

            async move {
                if cancel.is_cancelled() {
                    for _ in &services {
                        stats.record_task_skipped();
                    }
                    return services.iter().map(|_| TaskOutcome::Skipped).collect();
                }

                let permit = match region_sem.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        // Semaphore closed; treat as cancellation
                        for _ in &services {
                            stats.record_task_skipped();
                        }
                        return services.iter().map(|_| TaskOutcome::Skipped).collect();
                    }
                };

                debug!(region = %region, "Region active");

                let task_futures = services.into_iter().map(|descriptor| {
                    let region = region.clone();
                    let limiter = limiters[&descriptor.name].clone();
                    let retry = retry.clone();
                    let cancel = cancel.clone();
                    let stats = stats.clone();

                    async move {
                        run_task(
                            descriptor,
                            region,
                            limiter,
                            retry,
                            task_deadline,
                            max_items,
                            cancel,
                            stats,
                        )
                        .await
                    }
                });

                let outcomes: Vec<TaskOutcome> = stream::iter(task_futures)
                    .buffer_unordered(max_concurrent_services)
                    .collect()
                    .await;

                drop(permit);
                outcomes
            }
        });

        // Poll every region future; the semaphore enforces the real bound
        let all_outcomes: Vec<Vec<TaskOutcome>> = stream::iter(region_futures)
            .buffer_unordered(regions.len().max(1))
            .collect()
            .await;

        let mut records = Vec::new();
        let mut errors = Vec::new();
        let mut succeeded = 0usize;

        for outcome in all_outcomes.into_iter().flatten() {
            match outcome {
                TaskOutcome::Success(task_records) => {
                    succeeded += 1;
                    records.extend(task_records);
                }
                TaskOutcome::Failed(scan_error) => errors.push(scan_error),
                TaskOutcome::Skipped => {}
            }
        }

        let completed_at = Utc::now();

        info!(
            succeeded,
            failed = errors.len(),
            skipped = self.stats.tasks_skipped(),
            resources = records.len(),
            elapsed_ms = (completed_at - started_at).num_milliseconds(),
            "Scan complete"
        );

        if succeeded == 0 && !errors.is_empty() && !self.cancel.is_cancelled() {
            error!(failed = errors.len(), "Every scan task failed");
            return Err(CsError::AllTasksFailed {
                failed: errors.len(),
            });
        }

        Ok(RawScanOutput {
            records,
            errors,
            started_at,
            completed_at,
        })
    }
}

/// Run one (region, service) task to its single outcome.
#[allow(clippy::too_many_arguments)]
async fn run_task(
    descriptor: ServiceDescriptor,
    region: Region,
    limiter: Arc<TokenBucket>,
    retry: Arc<RetryPolicy>,
    task_deadline: std::time::Duration,
    max_items: usize,
    cancel: CancelFlag,
    stats: Arc<ScanStats>,
) -> TaskOutcome {
    if cancel.is_cancelled() {
        stats.record_task_skipped();
        return TaskOutcome::Skipped;
    }

    let deadline = std::time::Instant::now() + task_deadline;
    let drain = drain_pages(
        descriptor.scanner.as_ref(),
        &region,
        &limiter,
        &retry,
        deadline,
        max_items,
    );

    match tokio::time::timeout(task_deadline, drain).await {
        Ok(Ok(drained)) => {
            stats.record_task_success(
                drained.records.len() as u64,
                drained.calls as u64,
                drained.truncated,
            );
            TaskOutcome::Success(drained.records)
        }
        Ok(Err(failed)) => {
            warn!(
                service = descriptor.name,
                region = %region,
                attempts = failed.attempted.attempts,
                calls = failed.calls,
                error = %failed.attempted.error,
                "Task failed"
            );
            stats.record_task_failure(failed.calls as u64);
            TaskOutcome::Failed(ScanError {
                service: descriptor.name,
                region,
                kind: failed.attempted.error.kind(),
                message: failed.attempted.error.to_string(),
                retryable: failed.attempted.retryable(),
                attempts: failed.attempted.attempts,
            })
        }
        Err(_) => {
            // Backstop for calls that hang past every cooperative check
            warn!(
                service = descriptor.name,
                region = %region,
                deadline_ms = task_deadline.as_millis() as u64,
                "Task deadline exceeded"
            );
            stats.record_task_failure(0);
            TaskOutcome::Failed(ScanError {
                service: descriptor.name,
                region,
                kind: cs_error::ErrorKind::Timeout,
                message: "task deadline exceeded".to_string(),
                retryable: false,
                attempts: 0,
            })
        }
    }
}
