//! Application layer
//!
//! Use cases built on top of the crawl engine's output.

pub mod report;

pub use report::{Stats, compute_stats, find_latest_csv, load_records, render_report};
