//! Resource records and per-task scan errors.

use chrono::{DateTime, Utc};
use cs_error::ErrorKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A cloud provider region code (e.g. `us-east-1`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(pub String);

impl Region {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Region {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// A single discovered resource.
///
/// Attribute and tag maps are BTreeMaps so equality is order-independent
/// and serialization is deterministic. `monthly_cost` is `None` until the
/// report aggregator applies the pricing table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Service this resource belongs to (e.g. `EC2`)
    pub service: String,

    /// Region the resource lives in
    pub region: Region,

    /// Provider-assigned identifier, unique within (service, region)
    pub id: String,

    /// Resource type within the service (e.g. `Instance`, `Volume`)
    pub resource_type: String,

    /// Human-friendly name, usually from a `Name` tag
    pub name: Option<String>,

    /// Lifecycle state as reported by the provider
    pub state: Option<String>,

    /// Creation timestamp, when the provider reports one
    pub created_at: Option<DateTime<Utc>>,

    /// Type-specific attributes used for display and cost estimation
    pub attributes: BTreeMap<String, String>,

    /// Provider tags
    pub tags: BTreeMap<String, String>,

    /// Estimated monthly cost in USD, populated during aggregation
    pub monthly_cost: Option<f64>,
}

impl ResourceRecord {
    /// Create a record with the required identity fields; everything else
    /// starts empty and is filled via the builder methods.
    pub fn new(
        service: impl Into<String>,
        region: Region,
        id: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            region,
            id: id.into(),
            resource_type: resource_type.into(),
            name: None,
            state: None,
            created_at: None,
            attributes: BTreeMap::new(),
            tags: BTreeMap::new(),
            monthly_cost: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    /// Attribute lookup helper for the cost estimator.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Name for display, falling back to the id.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// The recorded failure of one scan task.
///
/// A failed (region, service) task produces exactly one of these; sibling
/// tasks are unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanError {
    /// Service that failed to scan
    pub service: String,

    /// Region the task targeted
    pub region: Region,

    /// Classified error kind
    pub kind: ErrorKind,

    /// Human-readable message from the final attempt
    pub message: String,

    /// Whether the error class was retryable
    pub retryable: bool,

    /// Invocations the failing call made before giving up
    pub attempts: u32,
}
