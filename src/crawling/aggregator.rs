//! Merging per-page results and the final rank ordering.

use std::collections::HashSet;
use tracing::debug;

use crate::domain::{PageResult, Record, sort_by_rank};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedRecords {
    pub records: Vec<Record>,
    pub duplicates_dropped: usize,
}

/// Concatenate page results in page order.
///
/// Records keep their within-page order. A record whose detail link was
/// already seen earlier in the run is dropped; records without a link are
/// always kept.
pub fn merge_pages(mut pages: Vec<PageResult>) -> MergedRecords {
    pages.sort_by_key(|p| p.page);

    let mut seen = HashSet::new();
    let mut merged = MergedRecords::default();
    for page in pages {
        for record in page.records {
            if let Some(link) = &record.detail_ref {
                if !seen.insert(link.clone()) {
                    debug!("Duplicate {} on page {} dropped", link, page.page);
                    merged.duplicates_dropped += 1;
                    continue;
                }
            }
            merged.records.push(record);
        }
    }
    merged
}

/// Final ordering applied once all phases are done
pub fn finalize(records: Vec<Record>) -> Vec<Record> {
    sort_by_rank(records)
}
