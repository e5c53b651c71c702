//! Configuration infrastructure
//!
//! Contains configuration loading and management for the must-play crawler.
//!
//! Configuration is organized into three sections:
//! 1. `crawling`: source, page range and per-phase pacing
//! 2. `parsing`: structural selectors and the supplemental-count label
//! 3. `logging`: log level and outputs

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;
use tracing::{info, warn};

use crate::domain::ListingQuery;
use crate::domain::constants::{crawling as crawl_defaults, site};
use crate::infrastructure::parsing::ParsingConfig;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub crawling: CrawlingConfig,
    pub parsing: ParsingConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.crawling.validate()?;
        if self.parsing.supplemental_label.trim().is_empty() {
            return Err(ConfigError::EmptySupplementalLabel);
        }
        Ok(())
    }
}

/// Caller misconfiguration; the only fatal error class
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Page indices are 1-based, got start page {start}")]
    ZeroStartPage { start: u32 },

    #[error("Invalid page range: start {start} > end {end}")]
    InvalidPageRange { start: u32, end: u32 },

    #[error("Invalid year range: min {min} > max {max}")]
    InvalidYearRange { min: i32, max: i32 },

    #[error("Concurrency for the {phase} phase must be at least 1")]
    ZeroConcurrency { phase: &'static str },

    #[error("Request timeout must be greater than 0")]
    ZeroTimeout,

    #[error("Supplemental-count label must not be empty")]
    EmptySupplementalLabel,
}

/// Crawling specific configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlingConfig {
    /// Source origin, e.g. "https://www.metacritic.com"
    pub origin: String,

    /// Listing endpoint path
    pub listing_path: String,

    /// Release year filter passed to the listing endpoint
    pub min_year: i32,
    pub max_year: i32,

    /// Inclusive page range
    pub start_page: u32,
    pub end_page: u32,

    /// Per-fetch timeout in seconds
    pub request_timeout_seconds: u64,

    /// Identification header value
    pub user_agent: String,

    /// Listing phase pacing
    pub listing: PhaseConfig,

    /// Run the detail enrichment phase
    pub enrich_details: bool,

    /// Detail phase pacing (independent of the listing phase)
    pub detail: PhaseConfig,
}

impl Default for CrawlingConfig {
    fn default() -> Self {
        Self {
            origin: site::ORIGIN.to_string(),
            listing_path: site::LISTING_PATH.to_string(),
            min_year: site::DEFAULT_YEAR_MIN,
            max_year: site::DEFAULT_YEAR_MAX,
            start_page: crawl_defaults::DEFAULT_START_PAGE,
            end_page: crawl_defaults::DEFAULT_END_PAGE,
            request_timeout_seconds: crawl_defaults::DEFAULT_REQUEST_TIMEOUT_SECONDS,
            user_agent: site::USER_AGENT.to_string(),
            listing: PhaseConfig::default(),
            enrich_details: false,
            detail: PhaseConfig::default(),
        }
    }
}

impl CrawlingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_page < site::PAGE_NUMBERING_BASE {
            return Err(ConfigError::ZeroStartPage {
                start: self.start_page,
            });
        }
        if self.start_page > self.end_page {
            return Err(ConfigError::InvalidPageRange {
                start: self.start_page,
                end: self.end_page,
            });
        }
        if self.min_year > self.max_year {
            return Err(ConfigError::InvalidYearRange {
                min: self.min_year,
                max: self.max_year,
            });
        }
        if self.listing.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency { phase: "listing" });
        }
        if self.enrich_details && self.detail.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency { phase: "detail" });
        }
        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    pub fn listing_query(&self) -> ListingQuery {
        ListingQuery {
            origin: self.origin.clone(),
            path: self.listing_path.clone(),
            min_year: self.min_year,
            max_year: self.max_year,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

/// Concurrency bound and pacing for one phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseConfig {
    /// Maximum simultaneous in-flight fetches; 1 means sequential
    pub concurrency: usize,

    /// Base post-fetch delay in milliseconds
    pub delay_ms: u64,

    /// Random extra delay, drawn uniformly from `0..=jitter_ms`
    pub jitter_ms: u64,
}

impl Default for PhaseConfig {
    fn default() -> Self {
        Self {
            concurrency: crawl_defaults::DEFAULT_CONCURRENCY,
            delay_ms: crawl_defaults::DEFAULT_DELAY_MS,
            jitter_ms: crawl_defaults::DEFAULT_JITTER_MS,
        }
    }
}

impl PhaseConfig {
    /// No pacing at all; used by offline replays and tests
    pub fn unpaced(concurrency: usize) -> Self {
        Self {
            concurrency,
            delay_ms: 0,
            jitter_ms: 0,
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs in the log file
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: true,
            max_files: 10,
            auto_cleanup_logs: true,
        }
    }
}

/// How [`ConfigManager::load_config_with_source`] obtained the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Parsed from the existing file
    File,
    /// No file existed; defaults were written
    CreatedDefault,
    /// The file did not parse; it was backed up and replaced by defaults
    ResetCorrupted {
        reason: String,
        backup: Option<PathBuf>,
    },
}

impl ConfigSource {
    /// Log the load outcome against `path`
    pub fn report(&self, path: &Path) {
        match self {
            Self::File => info!("Loaded configuration from: {:?}", path),
            Self::CreatedDefault => info!("Created default configuration: {:?}", path),
            Self::ResetCorrupted { reason, backup } => {
                warn!(
                    "⚠️  Configuration file {:?} was not valid ({}); using defaults",
                    path, reason
                );
                match backup {
                    Some(backup) => warn!("   Previous file kept at: {:?}", backup),
                    None => warn!("   Previous file could not be backed up"),
                }
            }
        }
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, Self::ResetCorrupted { .. })
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("mustplay-crawler");

        Ok(config_dir)
    }

    /// Configuration manager rooted at the platform config directory
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join("config.json");
        Ok(Self { config_path })
    }

    /// Configuration manager for an explicit file
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        self.load_config_with_source().await.map(|(config, _)| config)
    }

    /// Load configuration and report where it came from.
    ///
    /// Callers that load before logging is up use the source to report
    /// afterwards what happened to the file.
    pub async fn load_config_with_source(&self) -> Result<(AppConfig, ConfigSource)> {
        if !self.config_path.exists() {
            info!("Configuration file not found, creating default: {:?}", self.config_path);
            let default_config = AppConfig::default();
            self.save_config(&default_config).await?;
            return Ok((default_config, ConfigSource::CreatedDefault));
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read configuration file {:?}", self.config_path))?;

        match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => {
                info!("Loaded configuration from: {:?}", self.config_path);
                Ok((config, ConfigSource::File))
            }
            Err(parse_error) => {
                warn!("⚠️  Configuration file is not valid: {}", parse_error);

                let backup_path = self.config_path.with_extension("json.corrupted");
                let backup = match fs::copy(&self.config_path, &backup_path).await {
                    Ok(_) => {
                        info!("Backed up corrupted config to: {:?}", backup_path);
                        Some(backup_path)
                    }
                    Err(e) => {
                        warn!("Failed to create backup of corrupted config: {}", e);
                        None
                    }
                };

                let default_config = AppConfig::default();
                self.save_config(&default_config)
                    .await
                    .context("Failed to save default configuration")?;

                info!("✅ Reset to default configuration");
                Ok((
                    default_config,
                    ConfigSource::ResetCorrupted {
                        reason: parse_error.to_string(),
                        backup,
                    },
                ))
            }
        }
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create config directory")?;
            }
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.crawling.start_page, 1);
        assert_eq!(config.crawling.end_page, 16);
        assert_eq!(config.crawling.listing.concurrency, 1);
        assert!(!config.crawling.enrich_details);
    }

    #[rstest]
    #[case(0, 5, ConfigError::ZeroStartPage { start: 0 })]
    #[case(6, 5, ConfigError::InvalidPageRange { start: 6, end: 5 })]
    fn page_range_validation(#[case] start: u32, #[case] end: u32, #[case] expected: ConfigError) {
        let config = CrawlingConfig {
            start_page: start,
            end_page: end,
            ..CrawlingConfig::default()
        };
        assert_eq!(config.validate(), Err(expected));
    }

    #[test]
    fn detail_concurrency_only_checked_when_enrichment_enabled() {
        let mut config = CrawlingConfig {
            detail: PhaseConfig::unpaced(0),
            ..CrawlingConfig::default()
        };
        assert!(config.validate().is_ok());

        config.enrich_details = true;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroConcurrency { phase: "detail" })
        );
    }

    #[test]
    fn empty_label_is_rejected() {
        let mut config = AppConfig::default();
        config.parsing.supplemental_label = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::EmptySupplementalLabel));
    }

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        let config = manager.load_config().await.unwrap();

        assert!(manager.config_path().exists());
        assert_eq!(config.crawling.origin, site::ORIGIN);
    }

    #[tokio::test]
    async fn partial_file_falls_back_to_field_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"crawling": {"end_page": 3, "listing": {"concurrency": 4}}}"#)
            .unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();

        assert_eq!(config.crawling.end_page, 3);
        assert_eq!(config.crawling.start_page, 1);
        assert_eq!(config.crawling.listing.concurrency, 4);
        assert_eq!(config.crawling.listing.delay_ms, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[tokio::test]
    async fn corrupted_file_is_backed_up_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let config = ConfigManager::with_path(&path).load_config().await.unwrap();

        assert_eq!(config.crawling.end_page, 16);
        assert!(dir.path().join("config.json.corrupted").exists());
    }

    #[tokio::test]
    async fn corrupted_file_reset_is_reported_to_caller() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (_, source) = ConfigManager::with_path(&path)
            .load_config_with_source()
            .await
            .unwrap();

        assert!(source.is_reset());
        match source {
            ConfigSource::ResetCorrupted { reason, backup } => {
                assert!(!reason.is_empty());
                assert_eq!(backup, Some(dir.path().join("config.json.corrupted")));
            }
            other => panic!("unexpected source: {:?}", other),
        }
    }

    #[tokio::test]
    async fn load_source_distinguishes_new_and_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));

        let (_, first) = manager.load_config_with_source().await.unwrap();
        let (_, second) = manager.load_config_with_source().await.unwrap();

        assert_eq!(first, ConfigSource::CreatedDefault);
        assert_eq!(second, ConfigSource::File);
        assert!(!second.is_reset());
    }
}
