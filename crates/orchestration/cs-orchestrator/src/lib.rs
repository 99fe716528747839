//! Scan orchestration for cloudscan.
//!
//! This crate is the concurrency core: it schedules one task per
//! (region, service) pair under nested bounds, pushes every outbound API
//! call through a per-service token bucket and a backoff retry executor,
//! drains paged results into per-task record sets, and collects successes
//! and failures into one [`RawScanOutput`](cs_types::RawScanOutput).

pub mod cancel;
pub mod config;
pub mod orchestrator;
pub mod paginate;
pub mod rate_limit;
pub mod retry;
pub mod stats;

pub use cancel::CancelFlag;
pub use config::ScanConfig;
pub use orchestrator::Orchestrator;
pub use rate_limit::TokenBucket;
pub use retry::{Attempted, RetryPolicy};
pub use stats::{ScanStats, StatsSnapshot};
