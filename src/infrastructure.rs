//! Infrastructure layer: configuration, logging, HTTP fetching, HTML parsing
//! and CSV export.

pub mod config; // Configuration loading and validation
pub mod csv_export;
pub mod http_client;
pub mod logging;
pub mod parsing; // Listing and detail page extraction

pub use config::{AppConfig, ConfigError, ConfigManager, CrawlingConfig, LoggingConfig, PhaseConfig};
pub use http_client::{FetchError, FetchedPage, HttpClient, HttpClientConfig, PageFetcher};
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{ParsingConfig, ParsingError, ParsingResult, RecordExtractor, SupplementalCountParser};
