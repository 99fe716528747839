//! The service scanner capability trait.

use async_trait::async_trait;
use cs_error::ApiError;
use cs_types::{Region, ResourceRecord};
use std::sync::Arc;

/// One page of resource items from a service API.
///
/// `next_token` is the provider continuation token; `None` means the
/// enumeration is complete.
#[derive(Debug, Clone, Default)]
pub struct ResourcePage {
    /// Raw resource items in provider order
    pub items: Vec<ResourceRecord>,

    /// Continuation token for the next page, if any
    pub next_token: Option<String>,
}

impl ResourcePage {
    /// A final page with the given items and no continuation.
    pub fn last(items: Vec<ResourceRecord>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    /// A page followed by more results.
    pub fn with_next(items: Vec<ResourceRecord>, token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(token.into()),
        }
    }
}

/// Capability a service binding must provide to be scanned.
///
/// The core drives enumeration exclusively through [`fetch_page`]
/// (rate-limited and retried per call); how the implementation talks to
/// its provider API is its own business. Implementations must be
/// read-only and must classify their failures into [`ApiError`] variants.
///
/// Global services that only exist in one region should return an empty
/// final page for the regions they do not apply to.
///
/// [`fetch_page`]: ServiceScanner::fetch_page
#[async_trait]
pub trait ServiceScanner: Send + Sync {
    /// Name of the service this scanner enumerates (e.g. `EC2`).
    fn service_name(&self) -> &str;

    /// Fetch one page of resources in a region.
    ///
    /// `token` is the continuation token returned by the previous page,
    /// or `None` for the first page.
    async fn fetch_page(
        &self,
        region: &Region,
        token: Option<&str>,
    ) -> Result<ResourcePage, ApiError>;
}

/// A named scanner handle, enumerated at run start and filtered by the
/// include/skip lists before tasks are built.
#[derive(Clone)]
pub struct ServiceDescriptor {
    /// Service name used for filtering, grouping and logging
    pub name: String,

    /// The scanner capability
    pub scanner: Arc<dyn ServiceScanner>,
}

impl ServiceDescriptor {
    pub fn new(scanner: Arc<dyn ServiceScanner>) -> Self {
        Self {
            name: scanner.service_name().to_string(),
            scanner,
        }
    }
}

impl std::fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyScanner;

    #[async_trait]
    impl ServiceScanner for EmptyScanner {
        fn service_name(&self) -> &str {
            "Empty"
        }

        async fn fetch_page(
            &self,
            _region: &Region,
            _token: Option<&str>,
        ) -> Result<ResourcePage, ApiError> {
            Ok(ResourcePage::last(vec![]))
        }
    }

    #[tokio::test]
    async fn test_descriptor_takes_name_from_scanner() {
        let descriptor = ServiceDescriptor::new(Arc::new(EmptyScanner));
        assert_eq!(descriptor.name, "Empty");
        let page = descriptor
            .scanner
            .fetch_page(&Region::from("us-east-1"), None)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn test_page_constructors() {
        let page = ResourcePage::with_next(vec![], "token-1");
        assert_eq!(page.next_token.as_deref(), Some("token-1"));
        let page = ResourcePage::last(vec![]);
        assert!(page.next_token.is_none());
    }
}
