//! Listing pagination primitives.
//!
//! Responsibility:
//! - listing URL construction for a page index
//! - the per-page record sequence handed from extraction to aggregation

use url::Url;

use super::constants::site;
use super::record::Record;

/// Query against the listing endpoint, minus the page index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingQuery {
    pub origin: String,
    pub path: String,
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            origin: site::ORIGIN.to_string(),
            path: site::LISTING_PATH.to_string(),
            min_year: site::DEFAULT_YEAR_MIN,
            max_year: site::DEFAULT_YEAR_MAX,
        }
    }
}

impl ListingQuery {
    pub fn new(origin: impl Into<String>, min_year: i32, max_year: i32) -> Self {
        Self {
            origin: origin.into(),
            min_year,
            max_year,
            ..Self::default()
        }
    }

    /// Listing URL for `page`: `<origin><path>?releaseYearMin=..&releaseYearMax=..&page=..`
    ///
    /// Falls back to string formatting if the origin does not parse, so a bad
    /// origin surfaces later as a transport failure instead of a panic.
    pub fn url_for(&self, page: u32) -> String {
        match Url::parse(&self.origin).and_then(|base| base.join(&self.path)) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair(site::PARAM_YEAR_MIN, &self.min_year.to_string())
                    .append_pair(site::PARAM_YEAR_MAX, &self.max_year.to_string())
                    .append_pair(site::PARAM_PAGE, &page.to_string());
                url.to_string()
            }
            Err(_) => format!(
                "{}{}?{}={}&{}={}&{}={}",
                self.origin.trim_end_matches('/'),
                self.path,
                site::PARAM_YEAR_MIN,
                self.min_year,
                site::PARAM_YEAR_MAX,
                self.max_year,
                site::PARAM_PAGE,
                page
            ),
        }
    }
}

/// Ordered records extracted from one listing page.
///
/// An empty result is the early-stop signal for pagination.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub page: u32,
    pub records: Vec<Record>,
}

impl PageResult {
    pub fn new(page: u32, records: Vec<Record>) -> Self {
        Self { page, records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_url_carries_year_range_and_page() {
        let query = ListingQuery::default();
        assert_eq!(
            query.url_for(3),
            "https://www.metacritic.com/browse/game/?releaseYearMin=1958&releaseYearMax=2025&page=3"
        );
    }

    #[test]
    fn listing_url_respects_custom_origin() {
        let query = ListingQuery::new("http://127.0.0.1:8080", 2000, 2010);
        let url = query.url_for(1);
        assert!(url.starts_with("http://127.0.0.1:8080/browse/game/?"));
        assert!(url.contains("releaseYearMin=2000"));
        assert!(url.ends_with("page=1"));
    }

    #[test]
    fn empty_page_result_is_stop_signal() {
        let page = PageResult::new(4, Vec::new());
        assert!(page.is_empty());
        assert_eq!(page.len(), 0);
    }
}
