//! Parsing configuration for HTML extraction
//!
//! Centralized configuration for CSS selectors and the detail-page pattern.

use serde::{Deserialize, Serialize};

use crate::domain::constants::selectors;

/// Main parsing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingConfig {
    /// Listing card selectors
    pub listing: ListingSelectors,

    /// Word(s) that follow the count on a detail page
    pub supplemental_label: String,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            listing: ListingSelectors::default(),
            supplemental_label: selectors::SUPPLEMENTAL_LABEL.to_string(),
        }
    }
}

/// CSS selectors for listing pages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// One match per listed item
    pub item: String,

    /// Qualifying marker, evaluated inside an item
    pub marker: String,

    /// Position-indexed title heading children
    pub rank: String,
    pub title: String,

    pub release_date: String,
    pub score: String,

    /// Attribute on the item element holding the detail link
    pub detail_link_attr: String,

    /// chrono format of the release date text
    pub release_date_format: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            item: selectors::ITEM_CARD.to_string(),
            marker: selectors::MUST_PLAY_MARKER.to_string(),
            rank: selectors::RANK.to_string(),
            title: selectors::TITLE.to_string(),
            release_date: selectors::RELEASE_DATE.to_string(),
            score: selectors::SCORE.to_string(),
            detail_link_attr: selectors::DETAIL_LINK_ATTR.to_string(),
            release_date_format: selectors::RELEASE_DATE_FORMAT.to_string(),
        }
    }
}
