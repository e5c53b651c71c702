//! Listing traversal over `[start, end]`.
//!
//! The strategy follows the listing phase's concurrency bound:
//! - `Sequential` (bound 1): stops at the first empty page, later pages are
//!   never requested.
//! - `BoundedConcurrent` (bound > 1): every page is scheduled up front. Pages
//!   are extracted in index order once all fetches return, and records from
//!   the first empty page onwards are not accumulated. Those later fetches
//!   still happen; this trades wasted requests for throughput.
//!
//! Fetch failures never stop traversal in either mode.

#![allow(clippy::uninlined_format_args)]

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, warn};

use super::pacer::Pacer;
use crate::domain::{ListingQuery, PageResult};
use crate::infrastructure::http_client::PageFetcher;
use crate::infrastructure::parsing::RecordExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutionStrategy {
    Sequential,
    BoundedConcurrent { limit: usize },
}

impl ExecutionStrategy {
    pub fn from_concurrency(concurrency: usize) -> Self {
        if concurrency <= 1 {
            Self::Sequential
        } else {
            Self::BoundedConcurrent { limit: concurrency }
        }
    }
}

/// Why traversal ended; both are normal terminations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    RangeExhausted,
    EmptyPage { page: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingSummary {
    pub strategy: ExecutionStrategy,
    /// Pages for which a fetch was issued
    pub pages_requested: u32,
    pub pages_fetched: u32,
    pub pages_failed: u32,
    /// Pages whose records made it into the accumulator
    pub pages_accumulated: u32,
    pub records: usize,
    pub stop_reason: StopReason,
}

impl ListingSummary {
    fn new(strategy: ExecutionStrategy) -> Self {
        Self {
            strategy,
            pages_requested: 0,
            pages_fetched: 0,
            pages_failed: 0,
            pages_accumulated: 0,
            records: 0,
            stop_reason: StopReason::RangeExhausted,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListingOutcome {
    /// Non-empty page results in page-index order
    pub pages: Vec<PageResult>,
    pub summary: ListingSummary,
}

/// Drives listing traversal for one run
pub struct PaginationController {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<RecordExtractor>,
    pacer: Pacer,
    query: ListingQuery,
    timeout: Duration,
}

impl PaginationController {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<RecordExtractor>,
        pacer: Pacer,
        query: ListingQuery,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            pacer,
            query,
            timeout,
        }
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::from_concurrency(self.pacer.concurrency())
    }

    /// Traverse `start..=end`; an inverted range yields an empty outcome
    pub async fn run(&self, start: u32, end: u32) -> ListingOutcome {
        match self.strategy() {
            ExecutionStrategy::Sequential => self.run_sequential(start, end).await,
            ExecutionStrategy::BoundedConcurrent { .. } => self.run_concurrent(start, end).await,
        }
    }

    async fn run_sequential(&self, start: u32, end: u32) -> ListingOutcome {
        let mut summary = ListingSummary::new(ExecutionStrategy::Sequential);
        let mut pages = Vec::new();

        for page in start..=end {
            info!("➡️  PAGE {}", page);
            let url = self.query.url_for(page);
            summary.pages_requested += 1;

            let fetched = match self.fetcher.fetch(&url, self.timeout).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    summary.pages_failed += 1;
                    info!("   ⤬ Page {} skipped: {}", page, e);
                    continue;
                }
            };
            summary.pages_fetched += 1;

            let result = self.extractor.extract(&fetched.body, page);
            if result.is_empty() {
                info!("   ⤬ No must-plays on page {}, stopping traversal", page);
                summary.stop_reason = StopReason::EmptyPage { page };
                break;
            }

            summary.records += result.len();
            summary.pages_accumulated += 1;
            pages.push(result);
            info!("   📊 Total accumulated: {} records", summary.records);

            if page < end {
                self.pacer.pause().await;
            }
        }

        ListingOutcome { pages, summary }
    }

    async fn run_concurrent(&self, start: u32, end: u32) -> ListingOutcome {
        let mut summary = ListingSummary::new(self.strategy());
        let mut pages = Vec::new();

        let handles: Vec<_> = (start..=end)
            .map(|page| {
                info!("➡️  PAGE {} scheduled", page);
                let fetcher = Arc::clone(&self.fetcher);
                let pacer = self.pacer.clone();
                let url = self.query.url_for(page);
                let timeout = self.timeout;

                tokio::spawn(
                    async move {
                        let _permit = pacer.acquire().await;
                        let outcome = fetcher.fetch(&url, timeout).await;
                        if outcome.is_ok() {
                            pacer.pause().await;
                        }
                        outcome.map(|fetched| fetched.body)
                    }
                    .in_current_span(),
                )
            })
            .collect();
        summary.pages_requested = u32::try_from(handles.len()).unwrap_or(u32::MAX);

        let bodies = join_all(handles).await;

        for (page, joined) in (start..=end).zip(bodies) {
            let body = match joined {
                Ok(Ok(body)) => body,
                Ok(Err(e)) => {
                    summary.pages_failed += 1;
                    info!("   ⤬ Page {} skipped: {}", page, e);
                    continue;
                }
                Err(e) => {
                    summary.pages_failed += 1;
                    warn!("   ⤬ Page {} task failed: {}", page, e);
                    continue;
                }
            };
            summary.pages_fetched += 1;

            if let StopReason::EmptyPage { page: empty } = summary.stop_reason {
                debug!("   ⤬ Page {} discarded (at or after empty page {})", page, empty);
                continue;
            }

            let result = self.extractor.extract(&body, page);
            if result.is_empty() {
                info!("   ⤬ No must-plays on page {}, discarding later pages", page);
                summary.stop_reason = StopReason::EmptyPage { page };
                continue;
            }

            summary.records += result.len();
            summary.pages_accumulated += 1;
            pages.push(result);
            info!("   📊 Total accumulated: {} records", summary.records);
        }

        ListingOutcome { pages, summary }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::PhaseConfig;
    use crate::test_utils::{CardFixture, StubFetcher, listing_page, must_play_page};

    fn controller(stub: &Arc<StubFetcher>, concurrency: usize) -> PaginationController {
        PaginationController::new(
            Arc::clone(stub) as Arc<dyn PageFetcher>,
            Arc::new(RecordExtractor::new().unwrap()),
            Pacer::new(&PhaseConfig::unpaced(concurrency)),
            ListingQuery::default(),
            Duration::from_secs(1),
        )
    }

    /// 1.0-1.5 s after every successful fetch
    fn paced(concurrency: usize) -> PhaseConfig {
        PhaseConfig {
            concurrency,
            delay_ms: 1000,
            jitter_ms: 500,
        }
    }

    fn paced_controller(stub: &Arc<StubFetcher>, concurrency: usize) -> PaginationController {
        PaginationController::new(
            Arc::clone(stub) as Arc<dyn PageFetcher>,
            Arc::new(RecordExtractor::new().unwrap()),
            Pacer::new(&paced(concurrency)),
            ListingQuery::default(),
            Duration::from_secs(1),
        )
    }

    fn within_pause_window(gap: Duration) -> bool {
        gap >= Duration::from_millis(1000) && gap <= Duration::from_millis(1500)
    }

    fn page_url(page: u32) -> String {
        ListingQuery::default().url_for(page)
    }

    #[test]
    fn strategy_follows_concurrency() {
        assert_eq!(ExecutionStrategy::from_concurrency(1), ExecutionStrategy::Sequential);
        assert_eq!(
            ExecutionStrategy::from_concurrency(3),
            ExecutionStrategy::BoundedConcurrent { limit: 3 }
        );
    }

    #[tokio::test]
    async fn sequential_stops_at_first_empty_page() {
        let stub = Arc::new(
            StubFetcher::new()
                .with_body(page_url(1), must_play_page(1, 5))
                .with_body(page_url(2), must_play_page(6, 5))
                .with_body(page_url(3), listing_page(&[CardFixture::regular(11, "Filler")]))
                .with_body(page_url(4), must_play_page(12, 5)),
        );

        let outcome = controller(&stub, 1).run(1, 6).await;

        assert_eq!(outcome.summary.records, 10);
        assert_eq!(outcome.pages.len(), 2);
        assert_eq!(outcome.summary.stop_reason, StopReason::EmptyPage { page: 3 });
        assert_eq!(stub.requested(), vec![page_url(1), page_url(2), page_url(3)]);
    }

    #[tokio::test]
    async fn sequential_skips_failed_pages() {
        let stub = Arc::new(
            StubFetcher::new()
                .with_body(page_url(1), must_play_page(1, 2))
                .with_status(page_url(2), 503)
                .with_transport_error(page_url(3), "connection reset")
                .with_body(page_url(4), must_play_page(3, 2)),
        );

        let outcome = controller(&stub, 1).run(1, 4).await;

        assert_eq!(outcome.summary.pages_failed, 2);
        assert_eq!(outcome.summary.pages_fetched, 2);
        assert_eq!(outcome.summary.records, 4);
        assert_eq!(outcome.summary.stop_reason, StopReason::RangeExhausted);
        assert_eq!(outcome.pages.iter().map(|p| p.page).collect::<Vec<_>>(), vec![1, 4]);
    }

    #[tokio::test]
    async fn concurrent_fetches_past_empty_page_but_discards_records() {
        let stub = Arc::new(
            StubFetcher::new()
                .with_body(page_url(1), must_play_page(1, 3))
                .with_body(page_url(2), listing_page(&[]))
                .with_body(page_url(3), must_play_page(4, 3))
                .with_body(page_url(4), must_play_page(7, 3)),
        );

        let outcome = controller(&stub, 3).run(1, 4).await;

        assert_eq!(outcome.summary.records, 3);
        assert_eq!(outcome.summary.pages_accumulated, 1);
        assert_eq!(outcome.summary.stop_reason, StopReason::EmptyPage { page: 2 });
        assert_eq!(stub.requested().len(), 4);
    }

    #[tokio::test]
    async fn concurrent_keeps_page_order() {
        let stub = Arc::new(
            StubFetcher::new()
                .with_latency(Duration::from_millis(5))
                .with_body(page_url(1), must_play_page(1, 2))
                .with_body(page_url(2), must_play_page(3, 2))
                .with_body(page_url(3), must_play_page(5, 2)),
        );

        let outcome = controller(&stub, 3).run(1, 3).await;

        assert_eq!(outcome.pages.iter().map(|p| p.page).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(outcome.summary.stop_reason, StopReason::RangeExhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_pauses_between_successful_pages() {
        let stub = Arc::new(
            StubFetcher::new()
                .with_body(page_url(1), must_play_page(1, 2))
                .with_body(page_url(2), must_play_page(3, 2))
                .with_body(page_url(3), must_play_page(5, 2)),
        );
        let start = tokio::time::Instant::now();

        paced_controller(&stub, 1).run(1, 3).await;

        let at = stub.requested_at();
        assert_eq!(at.len(), 3);
        assert!(within_pause_window(at[1] - at[0]));
        assert!(within_pause_window(at[2] - at[1]));
        // No pause after the last page in range
        assert_eq!(start.elapsed(), at[2] - start);
    }

    #[tokio::test(start_paused = true)]
    async fn sequential_failed_fetch_is_not_paced() {
        let stub = Arc::new(
            StubFetcher::new()
                .with_body(page_url(1), must_play_page(1, 2))
                .with_status(page_url(2), 500)
                .with_body(page_url(3), must_play_page(3, 2)),
        );

        paced_controller(&stub, 1).run(1, 3).await;

        let at = stub.requested_at();
        assert!(within_pause_window(at[1] - at[0]));
        assert_eq!(at[2], at[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_permit_is_held_through_pause() {
        let stub = Arc::new(
            StubFetcher::new()
                .with_body(page_url(1), must_play_page(1, 2))
                .with_body(page_url(2), must_play_page(3, 2))
                .with_body(page_url(3), must_play_page(5, 2)),
        );
        let start = tokio::time::Instant::now();

        let outcome = paced_controller(&stub, 2).run(1, 3).await;

        let mut at = stub.requested_at();
        at.sort();
        assert_eq!(at[0], start);
        assert_eq!(at[1], start);
        assert!(within_pause_window(at[2] - start));
        assert_eq!(outcome.summary.records, 6);
    }

    #[tokio::test]
    async fn inverted_range_fetches_nothing() {
        let stub = Arc::new(StubFetcher::new());
        let outcome = controller(&stub, 1).run(5, 4).await;
        assert!(outcome.pages.is_empty());
        assert!(stub.requested().is_empty());
    }
}
