//! Console statistics for an exported must-play CSV.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::PathBuf;

use mustplay_crawler::application::report::{
    DEFAULT_RECENT_CUTOFF, EXPORT_PREFIX, compute_stats_with_cutoff, find_latest_csv, load_records,
    render_report,
};

/// Analyze a must-play CSV file
#[derive(Debug, Parser)]
#[command(name = "mustplay-report", version, about, long_about = None)]
struct Cli {
    /// CSV file to analyze (latest export in the current directory by default)
    csv: Option<PathBuf>,

    /// First year listed under recent releases
    #[arg(long, default_value_t = DEFAULT_RECENT_CUTOFF)]
    since: i32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let path = match cli.csv {
        Some(path) => path,
        None => match find_latest_csv(&PathBuf::from("."), EXPORT_PREFIX)? {
            Some(path) => path,
            None => bail!("No CSV files found to analyze."),
        },
    };

    println!("Analyzing {}...", path.display());
    let records = load_records(&path)?;
    let stats = compute_stats_with_cutoff(&records, cli.since);
    print!("{}", render_report(&stats));
    Ok(())
}
