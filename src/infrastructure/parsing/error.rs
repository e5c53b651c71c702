//! Parser construction errors.
//!
//! Extraction itself never returns these: a body that yields nothing is an
//! empty page, and a field that cannot be read is absent.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error("Invalid CSS selector for {field}: {selector} - {reason}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        reason: String,
    },

    #[error("Invalid supplemental-count pattern for label '{label}': {reason}")]
    InvalidPattern { label: String, reason: String },

    #[error("Invalid origin '{origin}': {reason}")]
    InvalidOrigin { origin: String, reason: String },
}

impl ParsingError {
    pub fn invalid_selector(field: &'static str, selector: &str, reason: impl ToString) -> Self {
        Self::InvalidSelector {
            field,
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
