//! Domain module - records, listing queries and site constants
//!
//! Everything in here is free of IO: the crawl engine in `crawling` and the
//! adapters in `infrastructure` build on these types.

pub mod constants;
pub mod pagination;
pub mod record;

pub use pagination::{ListingQuery, PageResult};
pub use record::{Record, rank_key, sort_by_rank};
