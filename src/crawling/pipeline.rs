//! End-to-end crawl: listing → merge → optional enrichment → rank ordering.
//!
//! The phases are strictly ordered; enrichment never starts before the
//! listing phase has resolved. Only configuration problems surface as
//! errors, every per-fetch failure is absorbed by the phase it happens in.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use super::aggregator::{finalize, merge_pages};
use super::enrichment::{DetailEnricher, EnrichmentSummary};
use super::pacer::Pacer;
use super::pagination::{ListingSummary, PaginationController};
use crate::domain::Record;
use crate::infrastructure::config::{AppConfig, CrawlingConfig};
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig, PageFetcher};
use crate::infrastructure::parsing::{ParsingConfig, RecordExtractor, SupplementalCountParser};

/// Everything one run produced
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub run_id: Uuid,
    /// Rank-ordered, deduplicated records
    pub records: Vec<Record>,
    pub listing: ListingSummary,
    pub duplicates_dropped: usize,
    /// `None` when enrichment was not requested
    pub enrichment: Option<EnrichmentSummary>,
    pub elapsed: Duration,
}

pub struct CrawlPipeline {
    crawling: CrawlingConfig,
    parsing: ParsingConfig,
}

impl CrawlPipeline {
    pub fn new(crawling: CrawlingConfig, parsing: ParsingConfig) -> Self {
        Self { crawling, parsing }
    }

    pub fn from_app_config(config: &AppConfig) -> Self {
        Self::new(config.crawling.clone(), config.parsing.clone())
    }

    pub fn crawling_config(&self) -> &CrawlingConfig {
        &self.crawling
    }

    /// Run against the live site. The HTTP client lives for this run only.
    pub async fn run(&self) -> Result<CrawlOutcome> {
        self.crawling.validate()?;
        let client = HttpClient::new(HttpClientConfig::from_crawling_config(&self.crawling))
            .context("Failed to build HTTP client")?;
        self.run_with_fetcher(Arc::new(client)).await
    }

    /// Run with any fetch implementation (recorded pages, stubs, ...)
    pub async fn run_with_fetcher(&self, fetcher: Arc<dyn PageFetcher>) -> Result<CrawlOutcome> {
        let config = &self.crawling;
        config.validate()?;

        let extractor = Arc::new(
            RecordExtractor::with_config(&self.parsing.listing, &config.origin)
                .context("Invalid listing selectors")?,
        );
        let count_parser = if config.enrich_details {
            Some(Arc::new(
                SupplementalCountParser::with_label(&self.parsing.supplemental_label)
                    .context("Invalid supplemental-count label")?,
            ))
        } else {
            None
        };

        let run_id = Uuid::new_v4();
        let span = info_span!("crawl", %run_id);

        let outcome = async move {
            let started = Instant::now();
            info!("🚀 Must-play crawl started");
            info!(
                "   📄 Pages {}..={} | years {}..={} | listing concurrency {} | enrichment {}",
                config.start_page,
                config.end_page,
                config.min_year,
                config.max_year,
                config.listing.concurrency,
                if config.enrich_details { "on" } else { "off" }
            );

            let controller = PaginationController::new(
                Arc::clone(&fetcher),
                extractor,
                Pacer::new(&config.listing),
                config.listing_query(),
                config.request_timeout(),
            );
            let listing = controller.run(config.start_page, config.end_page).await;

            let merged = merge_pages(listing.pages);
            if merged.duplicates_dropped > 0 {
                info!("🔁 Dropped {} duplicate records", merged.duplicates_dropped);
            }
            let mut records = merged.records;

            let enrichment = match count_parser {
                Some(parser) => {
                    let enricher = DetailEnricher::new(
                        Arc::clone(&fetcher),
                        parser,
                        Pacer::new(&config.detail),
                        config.request_timeout(),
                    );
                    Some(enricher.enrich(&mut records).await)
                }
                None => None,
            };

            let records = finalize(records);
            let elapsed = started.elapsed();
            info!(
                "✅ Crawl finished: {} records from {} pages in {:.1}s",
                records.len(),
                listing.summary.pages_accumulated,
                elapsed.as_secs_f64()
            );

            CrawlOutcome {
                run_id,
                records,
                listing: listing.summary,
                duplicates_dropped: merged.duplicates_dropped,
                enrichment,
                elapsed,
            }
        }
        .instrument(span)
        .await;

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::{ConfigError, PhaseConfig};
    use crate::test_utils::{StubFetcher, detail_page, must_play_page};

    fn offline_config(start: u32, end: u32) -> CrawlingConfig {
        CrawlingConfig {
            start_page: start,
            end_page: end,
            listing: PhaseConfig::unpaced(1),
            detail: PhaseConfig::unpaced(1),
            ..CrawlingConfig::default()
        }
    }

    #[tokio::test]
    async fn invalid_range_is_rejected_before_fetching() {
        let stub = Arc::new(StubFetcher::new());
        let pipeline = CrawlPipeline::new(offline_config(3, 2), ParsingConfig::default());

        let err = pipeline
            .run_with_fetcher(Arc::clone(&stub) as Arc<dyn PageFetcher>)
            .await
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidPageRange { start: 3, end: 2 })
        );
        assert!(stub.requested().is_empty());
    }

    #[tokio::test]
    async fn enrichment_runs_after_listing() {
        let query = offline_config(1, 1).listing_query();
        let stub = Arc::new(
            StubFetcher::new()
                .with_body(query.url_for(1), must_play_page(1, 2))
                .with_body("https://www.metacritic.com/game/game-1/", detail_page(Some(50)))
                .with_body("https://www.metacritic.com/game/game-2/", detail_page(Some(7))),
        );
        let config = CrawlingConfig {
            enrich_details: true,
            ..offline_config(1, 1)
        };

        let outcome = CrawlPipeline::new(config, ParsingConfig::default())
            .run_with_fetcher(Arc::clone(&stub) as Arc<dyn PageFetcher>)
            .await
            .unwrap();

        assert_eq!(stub.requested()[0], query.url_for(1));
        assert_eq!(stub.requested().len(), 3);
        let counts: Vec<_> = outcome.records.iter().map(|r| r.supplemental_count).collect();
        assert_eq!(counts, vec![Some(50), Some(7)]);
        assert_eq!(outcome.enrichment.map(|s| s.populated), Some(2));
    }

    #[tokio::test]
    async fn enrichment_off_leaves_counts_absent() {
        let query = offline_config(1, 1).listing_query();
        let stub = Arc::new(StubFetcher::new().with_body(query.url_for(1), must_play_page(1, 3)));

        let outcome = CrawlPipeline::new(offline_config(1, 1), ParsingConfig::default())
            .run_with_fetcher(Arc::clone(&stub) as Arc<dyn PageFetcher>)
            .await
            .unwrap();

        assert!(outcome.enrichment.is_none());
        assert!(outcome.records.iter().all(|r| r.supplemental_count.is_none()));
        assert_eq!(stub.requested().len(), 1);
    }
}
