//! MongoDB-backed product repository
//!
//! Products are upserted by `product_id`. Every field is overwritten with
//! `$set`, except `created_at` which is only written on insert.

use anyhow::{Context, Result};
use async_trait::async_trait;
use mongodb::bson::{self, Document, doc};
use mongodb::options::{IndexOptions, UpdateOptions};
use mongodb::{Collection, IndexModel};
use tracing::{debug, info};

use crate::domain::product::Product;
use crate::domain::repositories::{ProductRepository, UpsertOutcome};
use crate::infrastructure::database_connection::DatabaseConnection;

pub const PRODUCT_ID_INDEX: &str = "product_id_unique";

pub struct MongoProductRepository {
    collection: Collection<Document>,
}

impl MongoProductRepository {
    pub fn new(connection: &DatabaseConnection) -> Self {
        Self::from_collection(connection.collection())
    }

    pub fn from_collection(collection: Collection<Document>) -> Self {
        Self { collection }
    }
}

/// Filter and update document for one product upsert
fn upsert_documents(product: &Product) -> Result<(Document, Document)> {
    let mut fields = bson::to_document(product)
        .with_context(|| format!("Failed to encode product {}", product.product_id))?;

    // Timestamps are stored as BSON dates, not the RFC 3339 strings serde emits
    fields.remove("created_at");
    fields.insert("updated_at", bson::DateTime::from_chrono(product.updated_at));

    let filter = doc! { "product_id": &product.product_id };
    let update = doc! {
        "$set": fields,
        "$setOnInsert": { "created_at": bson::DateTime::from_chrono(product.created_at) },
    };
    Ok((filter, update))
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "product_id": 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(PRODUCT_ID_INDEX.to_string())
                    .build(),
            )
            .build();

        self.collection
            .create_index(index, None)
            .await
            .context("Failed to create product_id index")?;
        info!("Ensured unique index '{}'", PRODUCT_ID_INDEX);
        Ok(())
    }

    async fn upsert_product(&self, product: &Product) -> Result<UpsertOutcome> {
        let (filter, update) = upsert_documents(product)?;
        let options = UpdateOptions::builder().upsert(true).build();

        let result = self
            .collection
            .update_one(filter, update, options)
            .await
            .with_context(|| format!("Failed to upsert product {}", product.product_id))?;

        let outcome = if result.upserted_id.is_some() {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        };
        debug!("Product {} {:?}", product.product_id, outcome);
        Ok(outcome)
    }

    async fn count_products(&self) -> Result<u64> {
        self.collection
            .count_documents(doc! {}, None)
            .await
            .context("Failed to count products")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::{DescriptionFacts, ProductStatus};
    use chrono::{Duration, TimeZone, Utc};

    fn sample_product() -> Product {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        Product {
            product_id: "P-1".to_string(),
            name: "Basic Tee".to_string(),
            colors: vec!["Black".to_string()],
            price: 199.9,
            discounted_price: 149.9,
            currency: "TRY".to_string(),
            product_type: Some("T-shirt".to_string()),
            series: None,
            season: Some("SS24".to_string()),
            quantity: 3,
            status: ProductStatus::Active,
            facts: DescriptionFacts {
                fabric: Some("Cotton".to_string()),
                ..DescriptionFacts::default()
            },
            images: vec!["/img/p1.jpg".to_string()],
            created_at: created,
            updated_at: created + Duration::hours(1),
        }
    }

    #[test]
    fn test_filter_targets_product_id() {
        let (filter, _) = upsert_documents(&sample_product()).unwrap();
        assert_eq!(filter, doc! { "product_id": "P-1" });
    }

    #[test]
    fn test_created_at_only_written_on_insert() {
        let product = sample_product();
        let (_, update) = upsert_documents(&product).unwrap();

        let set = update.get_document("$set").unwrap();
        assert!(!set.contains_key("created_at"));
        assert_eq!(
            set.get_datetime("updated_at").unwrap(),
            &bson::DateTime::from_chrono(product.updated_at)
        );

        let on_insert = update.get_document("$setOnInsert").unwrap();
        assert_eq!(
            on_insert.get_datetime("created_at").unwrap(),
            &bson::DateTime::from_chrono(product.created_at)
        );
    }

    #[test]
    fn test_facts_are_flattened_into_document() {
        let (_, update) = upsert_documents(&sample_product()).unwrap();
        let set = update.get_document("$set").unwrap();

        assert_eq!(set.get_str("fabric").unwrap(), "Cotton");
        assert!(set.contains_key("model_on_body"));
        assert_eq!(set.get_str("status").unwrap(), "active");
        assert_eq!(set.get_i64("quantity").unwrap(), 3);
    }
}
