//! In-memory product repository
//!
//! Backs dry runs and tests. Follows the same upsert rules as the MongoDB
//! repository: keyed by `product_id`, `created_at` kept from the first insert.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::domain::product::Product;
use crate::domain::repositories::{ProductRepository, UpsertOutcome};

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, product_id: &str) -> Option<Product> {
        self.products.read().await.get(product_id).cloned()
    }

    /// Stored products ordered by id
    pub async fn all(&self) -> Vec<Product> {
        self.products.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn ensure_indexes(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert_product(&self, product: &Product) -> Result<UpsertOutcome> {
        let mut products = self.products.write().await;
        let mut stored = product.clone();

        let outcome = match products.get(&product.product_id) {
            Some(existing) => {
                stored.created_at = existing.created_at;
                UpsertOutcome::Updated
            }
            None => UpsertOutcome::Inserted,
        };

        products.insert(stored.product_id.clone(), stored);
        Ok(outcome)
    }

    async fn count_products(&self) -> Result<u64> {
        Ok(self.products.read().await.len() as u64)
    }
}
