//! Must-play crawler
//!
//! Crawls the Metacritic game browser's paginated listing, keeps the items
//! carrying the "must-play" badge, optionally enriches each one from its
//! detail page and hands back a rank-ordered result.

// Module declarations
pub mod application;
pub mod crawling;
pub mod domain;
pub mod infrastructure;
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;

pub use crawling::{CrawlOutcome, CrawlPipeline};
pub use domain::Record;
