//! Must-play crawler: crawl the listing range and write a rank-ordered CSV.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use mustplay_crawler::crawling::CrawlPipeline;
use mustplay_crawler::domain::constants::crawling::OUTPUT_FILE_PATTERN;
use mustplay_crawler::infrastructure::config::ConfigSource;
use mustplay_crawler::infrastructure::{AppConfig, ConfigManager, csv_export, init_logging_with_config};

/// Collect the "must-play" games from the Metacritic game browser
#[derive(Debug, Parser)]
#[command(name = "mustplay-crawler", version, about, long_about = None)]
struct Cli {
    /// First listing page (inclusive)
    #[arg(long)]
    start: Option<u32>,

    /// Last listing page (inclusive)
    #[arg(long)]
    end: Option<u32>,

    /// Output CSV file (defaults to metacritic_must_play_<date>.csv)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Base delay in seconds after each fetch, plus the configured jitter
    #[arg(long)]
    delay: Option<f64>,

    /// Simultaneous listing requests; 1 crawls sequentially
    #[arg(long)]
    concurrency: Option<usize>,

    /// Fetch each game's detail page for its critic review count
    #[arg(long)]
    enrich: bool,

    /// Simultaneous detail requests
    #[arg(long)]
    detail_concurrency: Option<usize>,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Command-line values win over the configuration file
    fn apply(&self, config: &mut AppConfig) {
        let crawling = &mut config.crawling;
        if let Some(start) = self.start {
            crawling.start_page = start;
        }
        if let Some(end) = self.end {
            crawling.end_page = end;
        }
        if let Some(delay) = self.delay {
            let delay_ms = (delay.max(0.0) * 1000.0).round() as u64;
            crawling.listing.delay_ms = delay_ms;
            crawling.detail.delay_ms = delay_ms;
        }
        if let Some(concurrency) = self.concurrency {
            crawling.listing.concurrency = concurrency;
        }
        if self.enrich {
            crawling.enrich_details = true;
        }
        if let Some(concurrency) = self.detail_concurrency {
            crawling.detail.concurrency = concurrency;
        }
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(Local::now().format(OUTPUT_FILE_PATTERN).to_string()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    let (mut config, source) = manager.load_config_with_source().await?;
    cli.apply(&mut config);

    // Loading happens before logging exists; report its outcome now
    match init_logging_with_config(&config.logging) {
        Ok(()) => source.report(manager.config_path()),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            if let ConfigSource::ResetCorrupted { reason, .. } = &source {
                eprintln!(
                    "Configuration file {} was not valid ({reason}); using defaults",
                    manager.config_path().display()
                );
            }
        }
    }
    config.validate().context("Invalid crawl configuration")?;

    let output = cli.output_path();
    let outcome = CrawlPipeline::from_app_config(&config).run().await?;

    if outcome.records.is_empty() {
        warn!("⚠️  No must-play games collected");
    }
    csv_export::write_records(&output, &outcome.records, config.crawling.enrich_details)?;

    println!("\n✅ {} games saved to {}", outcome.records.len(), output.display());
    info!(
        run_id = %outcome.run_id,
        pages_failed = outcome.listing.pages_failed,
        duplicates = outcome.duplicates_dropped,
        "Run complete"
    );
    Ok(())
}
