use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stock-derived availability of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
}

impl ProductStatus {
    /// A product is active only while it has stock on hand
    pub fn from_quantity(quantity: i64) -> Self {
        if quantity > 0 {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Labeled facts pulled out of the free-text HTML description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionFacts {
    pub fabric: Option<String>,
    pub model_measurements: Option<String>,
    pub product_measurements: Option<String>,
    pub product_info: Option<String>,
    pub model_on_body: Option<String>,
}

impl DescriptionFacts {
    pub fn is_empty(&self) -> bool {
        self.fabric.is_none()
            && self.model_measurements.is_none()
            && self.product_measurements.is_none()
            && self.product_info.is_none()
            && self.model_on_body.is_none()
    }
}

/// Normalized catalog record, one per feed entry.
///
/// Built once by the product builder and persisted as-is; `product_id` is the
/// upsert key of the destination collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub colors: Vec<String>,
    pub price: f64,
    pub discounted_price: f64,
    pub currency: String,
    pub product_type: Option<String>,
    pub series: Option<String>,
    pub season: Option<String>,
    pub quantity: i64,
    pub status: ProductStatus,
    #[serde(flatten)]
    pub facts: DescriptionFacts,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Whether the feed carried a real markdown (discount below list price)
    pub fn has_discount(&self) -> bool {
        self.discounted_price < self.price
    }
}
