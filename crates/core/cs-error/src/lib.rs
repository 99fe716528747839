//! Error types and classification for cloudscan.
//!
//! This crate provides:
//! - [`CsError`] - Top-level error enum for the scanner core
//! - [`ApiError`] - Classified errors from service API calls
//! - [`ErrorCategory`] and [`ErrorKind`] for retry decision making
//! - Classification helpers for raw SDK error strings

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for cloudscan.
///
/// Only two conditions escape a scan as fatal errors: a configuration
/// problem detected before any task starts, and a run where every task
/// failed. Per-task failures are captured inside the scan result instead.
#[derive(Error, Debug)]
pub enum CsError {
    /// Configuration errors (empty region/service set, invalid bounds)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every dispatched task failed; no usable result exists
    #[error("All {failed} scan tasks failed")]
    AllTasksFailed { failed: usize },

    /// A classified service API error
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Generic errors (wrapped anyhow)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Classified error from a single service API invocation.
#[derive(Error, Debug, Clone)]
pub enum ApiError {
    /// Authorization or permission denied
    #[error("Access denied: {0}")]
    Auth(String),

    /// Request-rate throttling by the provider
    #[error("Throttled: {0}")]
    Throttle(String),

    /// Transient network or server-side (5xx) failure
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// Malformed or invalid request
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// Task deadline elapsed
    #[error("Deadline exceeded: {0}")]
    Timeout(String),

    /// Anything the classifier could not place
    #[error("Unclassified error: {0}")]
    Other(String),
}

impl ApiError {
    /// The serializable kind tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Throttle(_) => ErrorKind::Throttle,
            Self::TransientNetwork(_) => ErrorKind::TransientNetwork,
            Self::Malformed(_) => ErrorKind::Malformed,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Other(_) => ErrorKind::Other,
        }
    }
}

/// Serializable mirror of the [`ApiError`] variants.
///
/// Stored on scan error records so downstream consumers can filter on
/// error class without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Throttle,
    TransientNetwork,
    Malformed,
    Timeout,
    Other,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auth => write!(f, "auth"),
            Self::Throttle => write!(f, "throttle"),
            Self::TransientNetwork => write!(f, "transient_network"),
            Self::Malformed => write!(f, "malformed"),
            Self::Timeout => write!(f, "timeout"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Error classification for retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient error - retry with exponential backoff
    Retryable,
    /// Permanent error - fail the task immediately
    Fatal,
}

/// Classifies an API error to determine retry behavior.
///
/// Throttling and transient network/5xx failures are retryable; auth and
/// malformed-request errors are fatal. A timeout is terminal for its task
/// and never retried. Unclassified errors are retried optimistically.
pub fn classify(error: &ApiError) -> ErrorCategory {
    match error {
        ApiError::Throttle(_) | ApiError::TransientNetwork(_) => ErrorCategory::Retryable,
        ApiError::Auth(_) | ApiError::Malformed(_) | ApiError::Timeout(_) => ErrorCategory::Fatal,
        ApiError::Other(_) => ErrorCategory::Retryable,
    }
}

/// Classify a raw provider error string into an [`ApiError`].
///
/// Adapter crates funnel SDK errors through this so the core only ever
/// sees classified variants. Matching is case-insensitive substring
/// matching on the provider error codes and HTTP statuses.
pub fn classify_raw(error: &str) -> ApiError {
    let lower = error.to_lowercase();

    if lower.contains("accessdenied")
        || lower.contains("unauthorizedoperation")
        || lower.contains("invalidclienttokenid")
        || lower.contains("expiredtoken")
        || lower.contains("403")
    {
        return ApiError::Auth(error.to_string());
    }

    if lower.contains("throttl")
        || lower.contains("requestlimitexceeded")
        || lower.contains("toomanyrequests")
        || lower.contains("slowdown")
        || lower.contains("429")
    {
        return ApiError::Throttle(error.to_string());
    }

    if lower.contains("timeout")
        || lower.contains("connection reset")
        || lower.contains("connection refused")
        || lower.contains("service unavailable")
        || lower.contains("500")
        || lower.contains("502")
        || lower.contains("503")
        || lower.contains("504")
    {
        return ApiError::TransientNetwork(error.to_string());
    }

    if lower.contains("validationerror")
        || lower.contains("invalidparameter")
        || lower.contains("malformed")
        || lower.contains("400")
    {
        return ApiError::Malformed(error.to_string());
    }

    ApiError::Other(error.to_string())
}

/// Result type alias using CsError.
pub type Result<T> = std::result::Result<T, CsError>;
