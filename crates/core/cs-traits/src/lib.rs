//! Capability traits for cloudscan.
//!
//! This crate defines the seam between the orchestration core and the
//! per-service API bindings:
//! - [`ServiceScanner`] - Trait a service binding must provide
//! - [`ResourcePage`] - One page of raw resource items plus continuation
//! - [`ServiceDescriptor`] - A named handle to a scanner capability

pub mod scanner;

pub use scanner::{ResourcePage, ServiceDescriptor, ServiceScanner};
