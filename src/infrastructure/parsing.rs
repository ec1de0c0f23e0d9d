//! Feed record parsing
//!
//! Turns raw feed entries into normalized `Product` records: HTML cleanup,
//! labeled fact extraction from descriptions and value normalization.

pub mod description_parser;
pub mod html_cleaner;
pub mod normalizer;
pub mod product_builder;

// Re-export public types
pub use crate::infrastructure::parsing_error::{ParsingError, ParsingResult};
pub use description_parser::{DescriptionParser, FactKind};
pub use html_cleaner::clean_html;
pub use normalizer::{ParsedPrice, normalize_currency, parse_price};
pub use product_builder::ProductBuilder;
