//! Listing page extraction
//!
//! Each item card is checked for the must-play marker first; cards without it
//! are dropped before any field is read. Fields of a qualifying card are read
//! independently and degrade to `None` on their own.

#![allow(clippy::uninlined_format_args)]

use chrono::NaiveDate;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

use super::config::ListingSelectors;
use super::error::{ParsingError, ParsingResult};
use crate::domain::constants::site;
use crate::domain::{PageResult, Record};

/// Parser turning one listing body into a [`PageResult`]
pub struct RecordExtractor {
    item_selector: Selector,
    marker_selector: Selector,
    rank_selector: Selector,
    title_selector: Selector,
    release_date_selector: Selector,
    score_selector: Selector,
    detail_link_attr: String,
    release_date_format: String,
    origin: Url,
}

impl RecordExtractor {
    /// Extractor with the default selectors against the default origin
    pub fn new() -> ParsingResult<Self> {
        Self::with_config(&ListingSelectors::default(), site::ORIGIN)
    }

    /// Create extractor with custom selector configuration
    pub fn with_config(selectors: &ListingSelectors, origin: &str) -> ParsingResult<Self> {
        let origin = Url::parse(origin).map_err(|e| ParsingError::InvalidOrigin {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            item_selector: compile_selector("item", &selectors.item)?,
            marker_selector: compile_selector("marker", &selectors.marker)?,
            rank_selector: compile_selector("rank", &selectors.rank)?,
            title_selector: compile_selector("title", &selectors.title)?,
            release_date_selector: compile_selector("release_date", &selectors.release_date)?,
            score_selector: compile_selector("score", &selectors.score)?,
            detail_link_attr: selectors.detail_link_attr.clone(),
            release_date_format: selectors.release_date_format.clone(),
            origin,
        })
    }

    /// Extract the qualifying records of one listing page, in document order
    pub fn extract(&self, body: &str, page: u32) -> PageResult {
        let document = Html::parse_document(body);
        let cards: Vec<ElementRef> = document.select(&self.item_selector).collect();
        debug!("   🔍 {} cards on page {}", cards.len(), page);

        let records: Vec<Record> = cards
            .iter()
            .enumerate()
            .filter(|(_, card)| self.qualifies(card))
            .map(|(index, card)| {
                let record = self.extract_record(card);
                debug!("      ➕  [{}.{}] {}", page, index + 1, record);
                record
            })
            .collect();

        info!(
            page,
            cards = cards.len(),
            qualifying = records.len(),
            "   ✔️  {} must-plays on page {}",
            records.len(),
            page
        );

        PageResult::new(page, records)
    }

    /// The marker is the only gate on a card becoming a record
    fn qualifies(&self, card: &ElementRef) -> bool {
        card.select(&self.marker_selector).next().is_some()
    }

    fn extract_record(&self, card: &ElementRef) -> Record {
        let release_date = self
            .text_of(card, &self.release_date_selector)
            .and_then(|text| parse_release_date(&text, &self.release_date_format));
        let score = self
            .text_of(card, &self.score_selector)
            .and_then(|text| parse_score(&text));
        let detail_ref = card
            .value()
            .attr(&self.detail_link_attr)
            .and_then(|href| self.resolve_detail_ref(href));

        Record {
            rank: self.text_of(card, &self.rank_selector),
            title: self.text_of(card, &self.title_selector),
            release_date,
            score,
            detail_ref,
            supplemental_count: None,
        }
    }

    /// Trimmed text of the first match; empty text counts as absent
    fn text_of(&self, card: &ElementRef, selector: &Selector) -> Option<String> {
        card.select(selector)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
    }

    /// Origin-relative links are joined to the origin, anything else is kept as-is
    pub fn resolve_detail_ref(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        if href.starts_with('/') {
            match self.origin.join(href) {
                Ok(url) => Some(url.to_string()),
                Err(e) => {
                    debug!("Could not resolve detail link '{}': {}", href, e);
                    None
                }
            }
        } else {
            Some(href.to_string())
        }
    }
}

fn compile_selector(field: &'static str, selector: &str) -> ParsingResult<Selector> {
    Selector::parse(selector).map_err(|e| ParsingError::invalid_selector(field, selector, e))
}

/// Parse a card's release date; unparseable text is an absent date
pub fn parse_release_date(text: &str, format: &str) -> Option<NaiveDate> {
    let text = text.trim();
    match NaiveDate::parse_from_str(text, format) {
        Ok(date) => Some(date),
        Err(e) => {
            debug!("Unparseable release date '{}': {}", text, e);
            None
        }
    }
}

/// Parse a card's score; non-numeric text ("tbd") is an absent score
pub fn parse_score(text: &str) -> Option<u32> {
    let text = text.trim();
    match text.parse::<u32>() {
        Ok(score) => Some(score),
        Err(_) => {
            debug!("Non-numeric score '{}'", text);
            None
        }
    }
}
