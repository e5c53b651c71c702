//! Detail page parsing: the supplemental count
//!
//! The page text is scanned for "<count> <label>" (e.g. "Based on 87 Critic
//! Reviews") and the first match wins. Markup between the count and the label
//! is flattened to whitespace before matching.

#![allow(clippy::uninlined_format_args)]

use regex::Regex;
use scraper::Html;
use tracing::debug;

use super::error::{ParsingError, ParsingResult};
use crate::domain::constants::selectors;

/// Extracts the first `<count> <label>` occurrence from a detail page
#[derive(Debug, Clone)]
pub struct SupplementalCountParser {
    pattern: Regex,
}

impl SupplementalCountParser {
    /// Parser for the default label
    pub fn new() -> ParsingResult<Self> {
        Self::with_label(selectors::SUPPLEMENTAL_LABEL)
    }

    /// Parser for a custom label; the label is matched literally, case-insensitively
    pub fn with_label(label: &str) -> ParsingResult<Self> {
        let words: Vec<String> = label.split_whitespace().map(regex::escape).collect();
        if words.is_empty() {
            return Err(ParsingError::InvalidPattern {
                label: label.to_string(),
                reason: "label is empty".to_string(),
            });
        }

        let source = format!(r"(?i)\b(\d{{1,3}}(?:,\d{{3}})+|\d+)\s+{}", words.join(r"\s+"));
        let pattern = Regex::new(&source).map_err(|e| ParsingError::InvalidPattern {
            label: label.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { pattern })
    }

    /// First count in the page text, `None` when the pattern does not occur
    pub fn parse(&self, body: &str) -> Option<u32> {
        let text = flatten_text(body);
        let captures = self.pattern.captures(&text)?;
        let digits = captures.get(1)?.as_str().replace(',', "");

        match digits.parse::<u32>() {
            Ok(count) => Some(count),
            Err(e) => {
                debug!("Supplemental count '{}' out of range: {}", digits, e);
                None
            }
        }
    }
}

/// Document text with every text node separated by a single space
fn flatten_text(body: &str) -> String {
    let document = Html::parse_document(body);
    document
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
