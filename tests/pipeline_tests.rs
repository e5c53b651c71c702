//! End-to-end crawl runs against an in-memory site

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use mustplay_crawler::crawling::{CrawlPipeline, StopReason};
use mustplay_crawler::domain::Record;
use mustplay_crawler::infrastructure::{CrawlingConfig, PageFetcher, ParsingConfig, PhaseConfig};
use mustplay_crawler::test_utils::{CardFixture, StubFetcher, detail_page, listing_page, must_play_page};

fn config(start: u32, end: u32, concurrency: usize) -> CrawlingConfig {
    CrawlingConfig {
        start_page: start,
        end_page: end,
        listing: PhaseConfig::unpaced(concurrency),
        detail: PhaseConfig::unpaced(concurrency),
        ..CrawlingConfig::default()
    }
}

fn page_url(page: u32) -> String {
    CrawlingConfig::default().listing_query().url_for(page)
}

async fn crawl(config: CrawlingConfig, stub: &Arc<StubFetcher>) -> Vec<Record> {
    CrawlPipeline::new(config, ParsingConfig::default())
        .run_with_fetcher(Arc::clone(stub) as Arc<dyn PageFetcher>)
        .await
        .unwrap()
        .records
}

fn ten_page_site() -> StubFetcher {
    (1..=10).fold(StubFetcher::new(), |stub, page| {
        stub.with_body(page_url(page), must_play_page(page * 10 - 9, 3))
    })
}

#[tokio::test]
async fn sequential_crawl_stops_after_empty_page() {
    let stub = Arc::new(
        StubFetcher::new()
            .with_body(page_url(1), must_play_page(1, 5))
            .with_body(page_url(2), must_play_page(6, 5))
            .with_body(page_url(3), listing_page(&[])),
    );

    let outcome = CrawlPipeline::new(config(1, 10, 1), ParsingConfig::default())
        .run_with_fetcher(Arc::clone(&stub) as Arc<dyn PageFetcher>)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 10);
    assert_eq!(outcome.listing.stop_reason, StopReason::EmptyPage { page: 3 });
    assert_eq!(stub.requested(), vec![page_url(1), page_url(2), page_url(3)]);
}

#[tokio::test]
async fn concurrency_does_not_change_the_record_set() {
    let sequential = Arc::new(ten_page_site());
    let concurrent = Arc::new(ten_page_site().with_latency(Duration::from_millis(2)));

    let a = crawl(config(1, 10, 1), &sequential).await;
    let b = crawl(config(1, 10, 3), &concurrent).await;

    assert_eq!(a.len(), 30);
    let a: HashSet<_> = a.into_iter().collect();
    let b: HashSet<_> = b.into_iter().collect();
    assert_eq!(a, b);
}

#[tokio::test]
async fn results_are_rank_ordered_across_pages() {
    let stub = Arc::new(
        StubFetcher::new()
            .with_body(page_url(1), must_play_page(9, 3))
            .with_body(page_url(2), must_play_page(1, 3)),
    );

    let records = crawl(config(1, 2, 2), &stub).await;

    let keys: Vec<u64> = records.iter().map(Record::rank_key).collect();
    assert_eq!(keys, vec![1, 2, 3, 9, 10, 11]);
}

#[tokio::test]
async fn failed_pages_are_skipped() {
    let stub = Arc::new(
        StubFetcher::new()
            .with_body(page_url(1), must_play_page(1, 2))
            .with_status(page_url(2), 500)
            .with_transport_error(page_url(3), "timeout")
            .with_body(page_url(4), must_play_page(3, 2)),
    );

    let outcome = CrawlPipeline::new(config(1, 4, 1), ParsingConfig::default())
        .run_with_fetcher(Arc::clone(&stub) as Arc<dyn PageFetcher>)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 4);
    assert_eq!(outcome.listing.pages_failed, 2);
    assert_eq!(outcome.listing.stop_reason, StopReason::RangeExhausted);
}

#[tokio::test]
async fn malformed_score_only_affects_that_field() {
    let cards = [
        CardFixture::must_play(1, "Good"),
        CardFixture {
            score: Some("tbd".to_string()),
            ..CardFixture::must_play(2, "Pending")
        },
        CardFixture::must_play(3, "Also Good"),
    ];
    let stub = Arc::new(StubFetcher::new().with_body(page_url(1), listing_page(&cards)));

    let records = crawl(config(1, 1, 1), &stub).await;

    assert_eq!(records.len(), 3);
    assert_eq!(records[1].title.as_deref(), Some("Pending"));
    assert_eq!(records[1].score, None);
    assert!(records[1].release_date.is_some());
    assert_eq!(records[0].score, Some(95));
    assert_eq!(records[2].score, Some(95));
}

#[tokio::test]
async fn duplicate_items_across_pages_are_kept_once() {
    let stub = Arc::new(
        StubFetcher::new()
            .with_body(page_url(1), must_play_page(1, 3))
            .with_body(page_url(2), must_play_page(3, 3)),
    );

    let outcome = CrawlPipeline::new(config(1, 2, 1), ParsingConfig::default())
        .run_with_fetcher(Arc::clone(&stub) as Arc<dyn PageFetcher>)
        .await
        .unwrap();

    assert_eq!(outcome.records.len(), 5);
    assert_eq!(outcome.duplicates_dropped, 1);
}

#[tokio::test]
async fn failed_detail_fetch_keeps_the_record() {
    let stub = Arc::new(
        StubFetcher::new()
            .with_body(page_url(1), must_play_page(1, 3))
            .with_body("https://www.metacritic.com/game/game-1/", detail_page(Some(101)))
            .with_status("https://www.metacritic.com/game/game-2/", 500)
            .with_body("https://www.metacritic.com/game/game-3/", detail_page(Some(2_345))),
    );
    let config = CrawlingConfig {
        enrich_details: true,
        ..config(1, 1, 2)
    };

    let outcome = CrawlPipeline::new(config, ParsingConfig::default())
        .run_with_fetcher(Arc::clone(&stub) as Arc<dyn PageFetcher>)
        .await
        .unwrap();

    let counts: Vec<Option<u32>> = outcome.records.iter().map(|r| r.supplemental_count).collect();
    assert_eq!(counts, vec![Some(101), None, Some(2_345)]);
    let summary = outcome.enrichment.unwrap();
    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.fetch_failed, 1);
}
