//! # Crawl engine
//!
//! Two strictly ordered phases over one fetch handle:
//! - listing: pagination with the early-stop heuristic (`pagination`)
//! - enrichment: one detail fetch per record with a detail link (`enrichment`)
//!
//! Both phases bound their in-flight fetches and pace them with a `Pacer`.
//! `aggregator` merges and orders the results; `pipeline` wires it together.

pub mod aggregator;
pub mod enrichment;
pub mod pacer;
pub mod pagination;
pub mod pipeline;

pub use aggregator::{MergedRecords, finalize, merge_pages};
pub use enrichment::{DetailEnricher, DetailOutcome, EnrichmentSummary};
pub use pacer::Pacer;
pub use pagination::{
    ExecutionStrategy, ListingOutcome, ListingSummary, PaginationController, StopReason,
};
pub use pipeline::{CrawlOutcome, CrawlPipeline};
