//! Domain module - catalog entities and persistence contracts
//!
//! Contains the normalized `Product` record and the repository trait the
//! sync job writes through.

pub mod product;
pub mod repositories;

pub use product::{DescriptionFacts, Product, ProductStatus};
pub use repositories::{ProductRepository, UpsertOutcome};
