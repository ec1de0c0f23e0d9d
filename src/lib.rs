//! Catalog Sync - product-catalog feed ingestion
//!
//! Reads a product XML feed, normalizes each entry into a `Product` record
//! (prices, currency, capitalization, stock status and labeled facts from
//! the HTML description) and upserts the records into MongoDB keyed by
//! product id.

// Module declarations
pub mod application;
pub mod domain;
pub mod infrastructure;
