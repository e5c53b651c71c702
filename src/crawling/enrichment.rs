//! Detail enrichment phase.
//!
//! Runs after listing traversal has fully resolved. Every record with a
//! detail link gets one fetch; the first supplemental count found on the page
//! is stored on the record. A failed fetch or a page without the pattern
//! leaves the count absent, and no record is ever dropped.

#![allow(clippy::uninlined_format_args)]

use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, warn};

use super::pacer::Pacer;
use super::pagination::ExecutionStrategy;
use crate::domain::Record;
use crate::infrastructure::http_client::{FetchError, PageFetcher};
use crate::infrastructure::parsing::SupplementalCountParser;

/// Result of one detail fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Populated(u32),
    NoMatch,
    FetchFailed(FetchError),
}

impl DetailOutcome {
    pub fn count(&self) -> Option<u32> {
        match self {
            Self::Populated(count) => Some(*count),
            Self::NoMatch | Self::FetchFailed(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentSummary {
    /// Records with a detail link, i.e. fetches issued
    pub attempted: usize,
    pub populated: usize,
    pub no_match: usize,
    pub fetch_failed: usize,
    /// Records without a detail link
    pub skipped: usize,
}

impl EnrichmentSummary {
    fn record(&mut self, outcome: &DetailOutcome) {
        match outcome {
            DetailOutcome::Populated(_) => self.populated += 1,
            DetailOutcome::NoMatch => self.no_match += 1,
            DetailOutcome::FetchFailed(_) => self.fetch_failed += 1,
        }
    }
}

pub struct DetailEnricher {
    fetcher: Arc<dyn PageFetcher>,
    parser: Arc<SupplementalCountParser>,
    pacer: Pacer,
    timeout: Duration,
}

impl DetailEnricher {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        parser: Arc<SupplementalCountParser>,
        pacer: Pacer,
        timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            parser,
            pacer,
            timeout,
        }
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::from_concurrency(self.pacer.concurrency())
    }

    /// Enrich `records` in place; the slice length never changes
    pub async fn enrich(&self, records: &mut [Record]) -> EnrichmentSummary {
        let targets: Vec<(usize, String)> = records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| record.detail_ref.clone().map(|url| (index, url)))
            .collect();

        let mut summary = EnrichmentSummary {
            attempted: targets.len(),
            skipped: records.len() - targets.len(),
            ..EnrichmentSummary::default()
        };
        info!(
            "🔎 Enriching {} records ({} without detail link)",
            summary.attempted, summary.skipped
        );

        let outcomes = match self.strategy() {
            ExecutionStrategy::Sequential => self.fetch_sequential(&targets).await,
            ExecutionStrategy::BoundedConcurrent { .. } => self.fetch_concurrent(&targets).await,
        };

        for ((index, url), outcome) in targets.iter().zip(outcomes) {
            summary.record(&outcome);
            match &outcome {
                DetailOutcome::Populated(count) => debug!("      ➕  {} → {}", url, count),
                DetailOutcome::NoMatch => debug!("      ∅  {} → no supplemental count", url),
                DetailOutcome::FetchFailed(e) => debug!("      ⤬  {} → {}", url, e),
            }
            if let Some(record) = records.get_mut(*index) {
                record.supplemental_count = outcome.count();
            }
        }

        info!(
            populated = summary.populated,
            no_match = summary.no_match,
            failed = summary.fetch_failed,
            "✔️  Enrichment finished"
        );
        summary
    }

    async fn fetch_sequential(&self, targets: &[(usize, String)]) -> Vec<DetailOutcome> {
        let mut outcomes = Vec::with_capacity(targets.len());
        for (position, (_, url)) in targets.iter().enumerate() {
            let outcome = fetch_detail(self.fetcher.as_ref(), &self.parser, url, self.timeout).await;
            let fetched = !matches!(outcome, DetailOutcome::FetchFailed(_));
            outcomes.push(outcome);
            if fetched && position + 1 < targets.len() {
                self.pacer.pause().await;
            }
        }
        outcomes
    }

    async fn fetch_concurrent(&self, targets: &[(usize, String)]) -> Vec<DetailOutcome> {
        let handles: Vec<_> = targets
            .iter()
            .map(|(_, url)| {
                let fetcher = Arc::clone(&self.fetcher);
                let parser = Arc::clone(&self.parser);
                let pacer = self.pacer.clone();
                let url = url.clone();
                let timeout = self.timeout;

                tokio::spawn(
                    async move {
                        let _permit = pacer.acquire().await;
                        let outcome = fetch_detail(fetcher.as_ref(), &parser, &url, timeout).await;
                        if !matches!(outcome, DetailOutcome::FetchFailed(_)) {
                            pacer.pause().await;
                        }
                        outcome
                    }
                    .in_current_span(),
                )
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| {
                joined.unwrap_or_else(|e| {
                    warn!("Detail task failed: {}", e);
                    DetailOutcome::FetchFailed(FetchError::Transport {
                        cause: format!("task failed: {e}"),
                    })
                })
            })
            .collect()
    }
}

async fn fetch_detail(
    fetcher: &dyn PageFetcher,
    parser: &SupplementalCountParser,
    url: &str,
    timeout: Duration,
) -> DetailOutcome {
    match fetcher.fetch(url, timeout).await {
        Ok(page) => parser
            .parse(&page.body)
            .map_or(DetailOutcome::NoMatch, DetailOutcome::Populated),
        Err(e) => DetailOutcome::FetchFailed(e),
    }
}
