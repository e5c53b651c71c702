//! Statistics over an exported must-play CSV.
//!
//! Loading is lenient: unknown columns are ignored and unparseable cells
//! become absent values, the same way extraction treats bad fields.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::Record;
use crate::infrastructure::csv_export::{SUPPLEMENTAL_COLUMN, read_rows};

/// Records released in or after this year are listed individually
pub const DEFAULT_RECENT_CUTOFF: i32 = 2020;

/// Number of entries in [`Stats::top_years`]
pub const TOP_YEARS: usize = 5;

/// File name prefix of crawler exports
pub const EXPORT_PREFIX: &str = "metacritic_must_play_";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearSummary {
    pub year: i32,
    pub count: usize,
    /// Mean over records that have a score
    pub average_score: Option<f64>,
    pub titles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentReleases {
    pub cutoff: i32,
    /// File order
    pub records: Vec<Record>,
    /// Ascending year
    pub by_year: Vec<YearSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total: usize,
    /// (decade, count), ascending decade; undated records are not counted
    pub by_decade: Vec<(i32, usize)>,
    /// (year, count), most records first, ties by ascending year
    pub top_years: Vec<(i32, usize)>,
    /// (score, count), ascending score
    pub score_distribution: Vec<(u32, usize)>,
    pub oldest: Option<Record>,
    pub newest: Option<Record>,
    pub recent: RecentReleases,
}

/// Load an exported CSV back into records
pub fn load_records(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))?;
    Ok(parse_records(&text))
}

/// Records from CSV text; the first row is the header
pub fn parse_records(text: &str) -> Vec<Record> {
    let mut rows = read_rows(text).into_iter();
    let Some(header) = rows.next() else {
        return Vec::new();
    };

    let column = |names: &[&str]| {
        header
            .iter()
            .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
    };
    let rank = column(&["rank"]);
    let title = column(&["title"]);
    let release_date = column(&["release_date"]);
    // Older exports call the score column "metascore"
    let score = column(&["score", "metascore"]);
    let supplemental = column(&[SUPPLEMENTAL_COLUMN]);

    rows.map(|row| {
        let cell = |index: Option<usize>| {
            index
                .and_then(|i| row.get(i))
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
        };
        Record {
            rank: cell(rank).map(str::to_string),
            title: cell(title).map(str::to_string),
            release_date: cell(release_date).and_then(parse_date),
            score: cell(score).and_then(|c| c.parse().ok()),
            detail_ref: None,
            supplemental_count: cell(supplemental).and_then(|c| c.parse().ok()),
        }
    })
    .collect()
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    // Accept a trailing time part ("2020-01-02 00:00:00")
    let date_part = text.split_whitespace().next().unwrap_or(text);
    match NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Unparseable date '{}': {}", text, e);
            None
        }
    }
}

pub fn compute_stats(records: &[Record]) -> Stats {
    compute_stats_with_cutoff(records, DEFAULT_RECENT_CUTOFF)
}

pub fn compute_stats_with_cutoff(records: &[Record], cutoff: i32) -> Stats {
    let years: Vec<i32> = records
        .iter()
        .filter_map(|r| r.release_date.map(|d| d.year()))
        .collect();

    let by_decade = count_by(years.iter().map(|y| y.div_euclid(10) * 10));

    let mut top_years = count_by(years.iter().copied());
    top_years.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    top_years.truncate(TOP_YEARS);

    let score_distribution = count_by(records.iter().filter_map(|r| r.score));

    let dated = || records.iter().filter(|r| r.release_date.is_some());
    let oldest = dated().min_by_key(|r| r.release_date).cloned();
    let newest = dated()
        .reduce(|best, r| if r.release_date > best.release_date { r } else { best })
        .cloned();

    Stats {
        total: records.len(),
        by_decade,
        top_years,
        score_distribution,
        oldest,
        newest,
        recent: recent_releases(records, cutoff),
    }
}

fn count_by<K: Ord>(keys: impl Iterator<Item = K>) -> Vec<(K, usize)> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts.into_iter().collect()
}

fn recent_releases(records: &[Record], cutoff: i32) -> RecentReleases {
    let recent: Vec<Record> = records
        .iter()
        .filter(|r| r.release_date.is_some_and(|d| d.year() >= cutoff))
        .cloned()
        .collect();

    let mut grouped: BTreeMap<i32, Vec<&Record>> = BTreeMap::new();
    for record in &recent {
        if let Some(date) = record.release_date {
            grouped.entry(date.year()).or_default().push(record);
        }
    }

    let by_year = grouped
        .into_iter()
        .map(|(year, group)| {
            let scores: Vec<u32> = group.iter().filter_map(|r| r.score).collect();
            let average_score = if scores.is_empty() {
                None
            } else {
                let total: f64 = scores.iter().map(|&s| f64::from(s)).sum();
                Some(total / scores.len() as f64)
            };
            YearSummary {
                year,
                count: group.len(),
                average_score,
                titles: group
                    .iter()
                    .map(|r| r.title.clone().unwrap_or_default())
                    .collect(),
            }
        })
        .collect();

    RecentReleases {
        cutoff,
        records: recent,
        by_year,
    }
}

/// Most recent export in `dir`, by file name
pub fn find_latest_csv(dir: &Path, prefix: &str) -> Result<Option<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let latest = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(prefix) && n.ends_with(".csv"))
        })
        .max_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(latest)
}

fn describe(record: &Record) -> String {
    format!(
        "{} ({}) - Score: {}",
        record.title.as_deref().unwrap_or("?"),
        record
            .release_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        record.score.map_or_else(|| "?".to_string(), |s| s.to_string())
    )
}

/// Console report
pub fn render_report(stats: &Stats) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_report(&mut out, stats);
    out
}

fn write_report(out: &mut String, stats: &Stats) -> std::fmt::Result {
    writeln!(out, "\n🎮 Total must-play games: {}", stats.total)?;

    writeln!(out, "\n📊 Games by decade:")?;
    for (decade, count) in &stats.by_decade {
        writeln!(out, "{}s = {}", decade, count)?;
    }

    writeln!(out, "\n📅 Top {} years with most must-play games:", TOP_YEARS)?;
    for (year, count) in &stats.top_years {
        writeln!(out, "{} = {}", year, count)?;
    }

    writeln!(out, "\n🏆 Score distribution:")?;
    for (score, count) in &stats.score_distribution {
        writeln!(out, "{} = {}", score, count)?;
    }

    if let Some(oldest) = &stats.oldest {
        writeln!(out, "\n📌 Oldest must-play game:\n{}", describe(oldest))?;
    }
    if let Some(newest) = &stats.newest {
        writeln!(out, "\n📌 Newest must-play game:\n{}", describe(newest))?;
    }

    let recent = &stats.recent;
    writeln!(
        out,
        "\n🆕 Must-play games released in {} or later: {}",
        recent.cutoff,
        recent.records.len()
    )?;
    for record in &recent.records {
        writeln!(out, "{}", describe(record))?;
    }

    writeln!(out, "\n📅 By year (with average score):")?;
    for year in &recent.by_year {
        match year.average_score {
            Some(avg) => writeln!(out, "{} = {} games | Avg score: {:.1}", year.year, year.count, avg)?,
            None => writeln!(out, "{} = {} games | Avg score: n/a", year.year, year.count)?,
        }
    }

    writeln!(out, "\n🎮 Games by year:")?;
    for year in &recent.by_year {
        writeln!(out, "{} = {}", year.year, year.titles.join(", "))?;
    }
    Ok(())
}
