//! Core data model for cloudscan.
//!
//! This crate defines the types that flow between the orchestrator, the
//! cost estimator and the report aggregator:
//! - [`Region`] and [`ResourceRecord`] - what was scanned and what was found
//! - [`ScanError`] - one failed scan task
//! - [`RawScanOutput`] - the orchestrator's unsorted output
//! - [`ScanResult`] and the summary types - the final aggregated report

pub mod record;
pub mod result;

pub use cs_error::ErrorKind;
pub use record::{Region, ResourceRecord, ScanError};
pub use result::{RawScanOutput, RegionSummary, ScanResult, ScanSummary, ServiceSummary};
