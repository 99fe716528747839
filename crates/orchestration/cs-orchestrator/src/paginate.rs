//! Pagination aggregation for one scan task.

use crate::rate_limit::TokenBucket;
use crate::retry::{Attempted, RetryPolicy};
use cs_traits::ServiceScanner;
use cs_types::{Region, ResourceRecord};
use std::time::Instant;
use tracing::{debug, warn};

/// Records drained from one task, with the call accounting needed for
/// stats.
#[derive(Debug)]
pub struct DrainedTask {
    /// All items across all pages, in page order
    pub records: Vec<ResourceRecord>,

    /// Total invocations made, retries included
    pub calls: u32,

    /// Whether the item cap cut enumeration short
    pub truncated: bool,
}

/// A task's terminal failure.
///
/// `attempted.attempts` counts only the failing call's invocations;
/// `calls` is the task total including earlier successful pages, kept for
/// stats.
#[derive(Debug)]
pub struct FailedTask {
    pub attempted: Attempted,
    pub calls: u32,
}

/// Drain a scanner's paged enumeration for one (region, service) task.
///
/// Every page fetch first takes a token from the service's bucket, then
/// runs under the retry policy. Pages are appended until no continuation
/// token is returned or `max_items` is reached. A terminal page failure
/// discards everything already collected - the task either contributes
/// all of its records or exactly one error, never a partial page set.
pub async fn drain_pages(
    scanner: &dyn ServiceScanner,
    region: &Region,
    limiter: &TokenBucket,
    retry: &RetryPolicy,
    deadline: Instant,
    max_items: usize,
) -> Result<DrainedTask, FailedTask> {
    let service = scanner.service_name();
    let mut records: Vec<ResourceRecord> = Vec::new();
    let mut token: Option<String> = None;
    let mut calls: u32 = 0;
    let mut truncated = false;

    loop {
        let page_token = token.clone();
        let result = retry
            .run(service, deadline, || {
                let page_token = page_token.clone();
                async move {
                    limiter.acquire(deadline).await?;
                    scanner.fetch_page(region, page_token.as_deref()).await
                }
            })
            .await;
        let (page, attempts) = match result {
            Ok(fetched) => fetched,
            Err(attempted) => {
                return Err(FailedTask {
                    calls: calls + attempted.attempts,
                    attempted,
                })
            }
        };

        calls += attempts;
        records.extend(page.items);

        if records.len() >= max_items {
            // Landing exactly on the cap with no further pages is a
            // complete enumeration
            truncated = records.len() > max_items || page.next_token.is_some();
            if truncated {
                warn!(
                    service,
                    region = %region,
                    cap = max_items,
                    "Item cap reached, truncating enumeration"
                );
                records.truncate(max_items);
            }
            break;
        }

        match page.next_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    debug!(
        service,
        region = %region,
        records = records.len(),
        calls,
        "Drained task"
    );

    Ok(DrainedTask {
        records,
        calls,
        truncated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cs_error::ApiError;
    use cs_traits::ResourcePage;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(1),
            multiplier: 2.0,
            jitter_fraction: 0.0,
        }
    }

    fn record(id: &str) -> ResourceRecord {
        ResourceRecord::new("Mock", Region::from("us-east-1"), id, "Thing")
    }

    /// Scanner that serves a fixed page sequence, optionally failing
    /// specific fetches.
    struct PagedScanner {
        pages: Vec<ResourcePage>,
        fetches: AtomicU32,
        fail_on_fetch: Option<(u32, ApiError)>,
        fail_from_fetch: Option<(u32, ApiError)>,
    }

    impl PagedScanner {
        fn new(pages: Vec<ResourcePage>) -> Self {
            Self {
                pages,
                fetches: AtomicU32::new(0),
                fail_on_fetch: None,
                fail_from_fetch: None,
            }
        }

        /// Fail exactly one fetch (retries after it succeed).
        fn failing_on(mut self, fetch: u32, error: ApiError) -> Self {
            self.fail_on_fetch = Some((fetch, error));
            self
        }

        /// Fail every fetch from the given one onward.
        fn failing_from(mut self, fetch: u32, error: ApiError) -> Self {
            self.fail_from_fetch = Some((fetch, error));
            self
        }
    }

    #[async_trait]
    impl ServiceScanner for PagedScanner {
        fn service_name(&self) -> &str {
            "Mock"
        }

        async fn fetch_page(
            &self,
            _region: &Region,
            token: Option<&str>,
        ) -> Result<ResourcePage, ApiError> {
            let fetch = self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some((fail_at, ref error)) = self.fail_on_fetch {
                if fetch == fail_at {
                    return Err(error.clone());
                }
            }
            if let Some((fail_from, ref error)) = self.fail_from_fetch {
                if fetch >= fail_from {
                    return Err(error.clone());
                }
            }

            let index = token.map(|t| t.parse::<usize>().unwrap()).unwrap_or(0);
            Ok(self.pages[index].clone())
        }
    }

    fn three_pages() -> Vec<ResourcePage> {
        vec![
            ResourcePage::with_next(vec![record("a"), record("b")], "1"),
            ResourcePage::with_next(vec![record("c")], "2"),
            ResourcePage::last(vec![]),
        ]
    }

    #[tokio::test]
    async fn test_drains_pages_in_order() {
        let scanner = PagedScanner::new(three_pages());
        let limiter = TokenBucket::new(1000.0, None);

        let drained = drain_pages(
            &scanner,
            &Region::from("us-east-1"),
            &limiter,
            &fast_policy(),
            far_deadline(),
            10_000,
        )
        .await
        .unwrap();

        let ids: Vec<&str> = drained.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(drained.calls, 3);
        assert!(!drained.truncated);
    }

    #[tokio::test]
    async fn test_transient_page_failure_recovers() {
        let scanner = PagedScanner::new(three_pages())
            .failing_on(1, ApiError::Throttle("rate exceeded".into()));
        let limiter = TokenBucket::new(1000.0, None);

        let drained = drain_pages(
            &scanner,
            &Region::from("us-east-1"),
            &limiter,
            &fast_policy(),
            far_deadline(),
            10_000,
        )
        .await
        .unwrap();

        let ids: Vec<&str> = drained.records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        // Second fetch took one retry
        assert_eq!(drained.calls, 4);
    }

    #[tokio::test]
    async fn test_terminal_failure_discards_partial_items() {
        let scanner =
            PagedScanner::new(three_pages()).failing_on(1, ApiError::Auth("AccessDenied".into()));
        let limiter = TokenBucket::new(1000.0, None);

        let result = drain_pages(
            &scanner,
            &Region::from("us-east-1"),
            &limiter,
            &fast_policy(),
            far_deadline(),
            10_000,
        )
        .await;

        // Page one succeeded, but nothing leaks out of the failed task
        let failed = result.unwrap_err();
        assert!(matches!(failed.attempted.error, ApiError::Auth(_)));
        // The error counts only the failing call; the task total keeps
        // the earlier page
        assert_eq!(failed.attempted.attempts, 1);
        assert_eq!(failed.calls, 2);
    }

    #[tokio::test]
    async fn test_earlier_pages_do_not_inflate_failure_attempts() {
        let scanner = PagedScanner::new(three_pages())
            .failing_from(2, ApiError::Throttle("rate exceeded".into()));
        let limiter = TokenBucket::new(1000.0, None);

        let result = drain_pages(
            &scanner,
            &Region::from("us-east-1"),
            &limiter,
            &fast_policy(),
            far_deadline(),
            10_000,
        )
        .await;

        // Two pages succeed, then the third exhausts its own retries
        let failed = result.unwrap_err();
        assert_eq!(failed.attempted.attempts, 4);
        assert_eq!(failed.calls, 6);
    }

    #[tokio::test]
    async fn test_item_cap_stops_enumeration() {
        let scanner = PagedScanner::new(vec![
            ResourcePage::with_next(vec![record("a"), record("b")], "1"),
            ResourcePage::with_next(vec![record("c"), record("d")], "2"),
            ResourcePage::last(vec![record("e")]),
        ]);
        let limiter = TokenBucket::new(1000.0, None);

        let drained = drain_pages(
            &scanner,
            &Region::from("us-east-1"),
            &limiter,
            &fast_policy(),
            far_deadline(),
            3,
        )
        .await
        .unwrap();

        assert_eq!(drained.records.len(), 3);
        assert!(drained.truncated);
        // Third page never fetched
        assert_eq!(scanner.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cap_landing_on_final_page_is_complete() {
        let scanner = PagedScanner::new(vec![
            ResourcePage::with_next(vec![record("a"), record("b")], "1"),
            ResourcePage::last(vec![record("c")]),
        ]);
        let limiter = TokenBucket::new(1000.0, None);

        let drained = drain_pages(
            &scanner,
            &Region::from("us-east-1"),
            &limiter,
            &fast_policy(),
            far_deadline(),
            3,
        )
        .await
        .unwrap();

        // Exactly the cap, with nothing left behind it
        assert_eq!(drained.records.len(), 3);
        assert!(!drained.truncated);
    }

    #[tokio::test]
    async fn test_cap_landing_with_pages_remaining_truncates() {
        let scanner = PagedScanner::new(vec![
            ResourcePage::with_next(vec![record("a"), record("b"), record("c")], "1"),
            ResourcePage::last(vec![record("d")]),
        ]);
        let limiter = TokenBucket::new(1000.0, None);

        let drained = drain_pages(
            &scanner,
            &Region::from("us-east-1"),
            &limiter,
            &fast_policy(),
            far_deadline(),
            3,
        )
        .await
        .unwrap();

        assert_eq!(drained.records.len(), 3);
        assert!(drained.truncated);
        assert_eq!(scanner.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_enumeration() {
        let scanner = PagedScanner::new(vec![ResourcePage::last(vec![])]);
        let limiter = TokenBucket::new(1000.0, None);

        let drained = drain_pages(
            &scanner,
            &Region::from("us-east-1"),
            &limiter,
            &fast_policy(),
            far_deadline(),
            10_000,
        )
        .await
        .unwrap();

        assert!(drained.records.is_empty());
        assert_eq!(drained.calls, 1);
    }
}
