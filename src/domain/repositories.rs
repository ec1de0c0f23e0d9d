//! Repository interfaces for catalog persistence
//!
//! The sync job only ever writes; reads are limited to what the job needs
//! to report on a finished run.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::domain::product::Product;

/// What a single upsert did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Make sure the store enforces uniqueness of the upsert key
    async fn ensure_indexes(&self) -> Result<()>;

    /// Insert the product, or overwrite the record with the same `product_id`.
    /// `created_at` of an existing record is preserved.
    async fn upsert_product(&self, product: &Product) -> Result<UpsertOutcome>;

    async fn count_products(&self) -> Result<u64>;
}
