//! Parsing error types for feed ingestion
//!
//! Every error here aborts the sync run. The variants carry enough context
//! (field, product id, raw value) to find the offending feed entry.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("Required field '{field}' not found in feed entry{}", describe_product(.product_id))]
    RequiredFieldMissing {
        field: String,
        product_id: Option<String>,
    },

    #[error("Invalid price in '{field}': {value:?}{}", describe_product(.product_id))]
    InvalidPrice {
        field: String,
        value: String,
        product_id: Option<String>,
    },

    #[error("XML parsing failed at byte {position}: {message}")]
    XmlParsingFailed { message: String, position: u64 },

    #[error("Invalid feed source '{source_ref}': {reason}")]
    InvalidFeedSource { source_ref: String, reason: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigurationError { message: String, field: String },
}

fn describe_product(product_id: &Option<String>) -> String {
    product_id
        .as_deref()
        .map(|id| format!(" (product {id})"))
        .unwrap_or_default()
}

impl ParsingError {
    /// Create a required field missing error
    pub fn required_field_missing(field: &str, product_id: Option<&str>) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
            product_id: product_id.map(ToString::to_string),
        }
    }

    /// Create an invalid price error
    pub fn invalid_price(field: &str, value: &str, product_id: &str) -> Self {
        Self::InvalidPrice {
            field: field.to_string(),
            value: value.to_string(),
            product_id: Some(product_id.to_string()),
        }
    }

    pub fn xml_parsing_failed(message: impl Into<String>, position: u64) -> Self {
        Self::XmlParsingFailed {
            message: message.into(),
            position,
        }
    }

    pub fn configuration(field: &str, message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
            field: field.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
