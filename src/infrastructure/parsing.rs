//! HTML parsing for listing and detail pages
//!
//! Selectors and patterns are compiled once per parser instance; parsing a
//! body never fails as a whole. Individual fields degrade to `None`.

pub mod config;
pub mod detail_parser;
pub mod error;
pub mod listing_parser;

pub use config::ParsingConfig;
pub use detail_parser::SupplementalCountParser;
pub use error::{ParsingError, ParsingResult};
pub use listing_parser::RecordExtractor;
