//! Feed entry to `Product` conversion
//!
//! Looks fields up through the configured element aliases, applies the
//! normalization rules and runs description fact extraction.

#![allow(clippy::uninlined_format_args)]

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::description_parser::DescriptionParser;
use super::normalizer::{
    capitalize, derive_status, non_empty, normalize_currency, parse_price, parse_quantity,
    split_list, title_case, ParsedPrice,
};
use super::{ParsingError, ParsingResult};
use crate::domain::product::{DescriptionFacts, Product};
use crate::infrastructure::config::{AppConfig, FieldMapping};
use crate::infrastructure::feed_reader::FeedEntry;

pub struct ProductBuilder {
    fields: FieldMapping,
    default_currency: String,
    description_parser: DescriptionParser,
}

impl ProductBuilder {
    /// Builder with the default field aliases and description labels
    pub fn new() -> ParsingResult<Self> {
        Self::from_config(&AppConfig::default())
    }

    pub fn from_config(config: &AppConfig) -> ParsingResult<Self> {
        Ok(Self {
            fields: config.feed.fields.clone(),
            default_currency: normalize_currency(&config.normalization.default_currency),
            description_parser: DescriptionParser::with_labels(&config.description)?,
        })
    }

    /// Build every entry; the first failure aborts the batch
    pub fn build_all(&self, entries: &[FeedEntry], now: DateTime<Utc>) -> ParsingResult<Vec<Product>> {
        entries.iter().map(|entry| self.build(entry, now)).collect()
    }

    pub fn build(&self, entry: &FeedEntry, now: DateTime<Utc>) -> ParsingResult<Product> {
        let product_id = first_value(entry, &self.fields.id)
            .ok_or_else(|| ParsingError::required_field_missing("id", None))?
            .to_string();

        let name = match first_value(entry, &self.fields.name) {
            Some(name) => title_case(name),
            None => {
                warn!("Product {} has no name; using its id", product_id);
                product_id.clone()
            }
        };

        let price = self.read_price(entry, &self.fields.price, "price", &product_id)?;
        let discounted = self.read_price(
            entry,
            &self.fields.discounted_price,
            "discounted_price",
            &product_id,
        )?;

        let price_amount = price.as_ref().map_or(0.0, |p| p.amount);
        if price.is_none() {
            warn!("Product {} has no price; storing 0", product_id);
        }

        let discounted_price = match discounted.as_ref() {
            Some(d) if d.amount > 0.0 => d.amount,
            _ => price_amount,
        };
        if discounted_price > price_amount {
            warn!(
                "Product {} has discounted price {} above list price {}",
                product_id, discounted_price, price_amount
            );
        }

        let currency = first_value(entry, &self.fields.currency)
            .map(normalize_currency)
            .or_else(|| price.as_ref().and_then(|p| p.unit.as_deref()).map(normalize_currency))
            .or_else(|| discounted.as_ref().and_then(|p| p.unit.as_deref()).map(normalize_currency))
            .unwrap_or_else(|| self.default_currency.clone());

        let quantity = first_value(entry, &self.fields.quantity).map_or(0, parse_quantity);

        let facts = first_value(entry, &self.fields.description)
            .map(|html| self.description_parser.extract_from_html(html))
            .unwrap_or_default();
        log_facts(&product_id, &facts);

        Ok(Product {
            product_id,
            name,
            colors: self.read_colors(entry),
            price: price_amount,
            discounted_price,
            currency,
            product_type: first_value(entry, &self.fields.product_type).map(capitalize),
            series: first_value(entry, &self.fields.series).map(capitalize),
            season: first_value(entry, &self.fields.season).map(str::to_uppercase),
            quantity,
            status: derive_status(quantity),
            facts,
            images: self.read_images(entry),
            created_at: now,
            updated_at: now,
        })
    }

    /// `Ok(None)` when the field is absent or blank; an error when it holds
    /// text without a number or a negative amount
    fn read_price(
        &self,
        entry: &FeedEntry,
        aliases: &[String],
        field: &str,
        product_id: &str,
    ) -> ParsingResult<Option<ParsedPrice>> {
        match first_value(entry, aliases) {
            None => Ok(None),
            Some(text) => match parse_price(text) {
                Some(price) if price.amount >= 0.0 => Ok(Some(price)),
                _ => Err(ParsingError::invalid_price(field, text, product_id)),
            },
        }
    }

    fn read_colors(&self, entry: &FeedEntry) -> Vec<String> {
        let mut colors: Vec<String> = Vec::new();
        for alias in &self.fields.color {
            for value in entry.values(alias) {
                for color in split_list(value) {
                    let color = title_case(&color);
                    if !colors.contains(&color) {
                        colors.push(color);
                    }
                }
            }
        }
        colors
    }

    /// Images come from exact alias matches and numbered variants
    /// (`image1`, `image2`, ...), ordered by alias then number
    fn read_images(&self, entry: &FeedEntry) -> Vec<String> {
        let mut keyed: Vec<(usize, u32, &[String])> = Vec::new();

        for (field, values) in entry.iter() {
            for (alias_index, alias) in self.fields.image.iter().enumerate() {
                let alias = alias.to_lowercase();
                let Some(suffix) = field.strip_prefix(alias.as_str()) else {
                    continue;
                };
                let order = if suffix.is_empty() {
                    Some(0)
                } else if suffix.chars().all(|c| c.is_ascii_digit()) {
                    suffix.parse::<u32>().ok()
                } else {
                    None
                };
                if let Some(order) = order {
                    keyed.push((alias_index, order, values));
                    break;
                }
            }
        }
        keyed.sort_by_key(|(alias_index, order, _)| (*alias_index, *order));

        let mut images: Vec<String> = Vec::new();
        for value in keyed.into_iter().flat_map(|(_, _, values)| values) {
            if let Some(path) = non_empty(value) {
                if !images.iter().any(|existing| existing == path) {
                    images.push(path.to_string());
                }
            }
        }
        images
    }
}

/// First non-blank value across the aliases, in alias order
fn first_value<'a>(entry: &'a FeedEntry, aliases: &[String]) -> Option<&'a str> {
    aliases
        .iter()
        .flat_map(|alias| entry.values(alias))
        .find_map(|value| non_empty(value))
}

fn log_facts(product_id: &str, facts: &DescriptionFacts) {
    if facts.is_empty() {
        debug!("Product {}: no labeled facts in description", product_id);
    } else {
        debug!(
            "Product {}: fabric={:?} model_measurements={:?} product_measurements={:?} product_info={:?} model_on_body={:?}",
            product_id,
            facts.fabric,
            facts.model_measurements,
            facts.product_measurements,
            facts.product_info,
            facts.model_on_body
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::ProductStatus;

    fn builder() -> ProductBuilder {
        ProductBuilder::new().unwrap()
    }

    fn full_entry() -> FeedEntry {
        FeedEntry::new()
            .with("id", "SKU-42")
            .with("name", "oversize LINEN shirt")
            .with("colors", "ecru, navy blue")
            .with("color", "Ecru")
            .with("price", "1.299,90 TL")
            .with("discounted_price", "999,90 TL")
            .with("product_type", "SHIRT")
            .with("series", "essentials")
            .with("season", "ss24")
            .with("quantity", "4")
            .with(
                "description",
                "<p>Fabric: 100% Linen</p><p>Model Measurements: Height 1.85</p>\
                 <p>Product Info: Relaxed fit</p><p>Model is wearing: L</p>",
            )
            .with("image2", "/img/42-b.jpg")
            .with("image10", "/img/42-j.jpg")
            .with("image1", "/img/42-a.jpg")
            .with("image", "/img/42-main.jpg")
    }

    #[test]
    fn test_builds_normalized_product() {
        let now = Utc::now();
        let product = builder().build(&full_entry(), now).unwrap();

        assert_eq!(product.product_id, "SKU-42");
        assert_eq!(product.name, "Oversize Linen Shirt");
        assert_eq!(product.colors, vec!["Ecru", "Navy Blue"]);
        assert!((product.price - 1299.9).abs() < 1e-9);
        assert!((product.discounted_price - 999.9).abs() < 1e-9);
        assert_eq!(product.currency, "TRY");
        assert_eq!(product.product_type.as_deref(), Some("Shirt"));
        assert_eq!(product.series.as_deref(), Some("Essentials"));
        assert_eq!(product.season.as_deref(), Some("SS24"));
        assert_eq!(product.quantity, 4);
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.facts.fabric.as_deref(), Some("100% Linen"));
        assert_eq!(product.facts.model_measurements.as_deref(), Some("Height 1.85"));
        assert_eq!(product.facts.product_info.as_deref(), Some("Relaxed fit"));
        assert_eq!(product.facts.model_on_body.as_deref(), Some("L"));
        assert!(product.facts.product_measurements.is_none());
        assert_eq!(
            product.images,
            vec!["/img/42-main.jpg", "/img/42-a.jpg", "/img/42-b.jpg", "/img/42-j.jpg"]
        );
        assert_eq!(product.created_at, now);
        assert_eq!(product.updated_at, now);
    }

    #[test]
    fn test_missing_id_is_an_error() {
        let entry = FeedEntry::new().with("name", "No Id").with("id", "   ");
        let err = builder().build(&entry, Utc::now()).unwrap_err();
        assert!(matches!(err, ParsingError::RequiredFieldMissing { ref field, .. } if field == "id"));
    }

    #[test]
    fn test_minimal_entry_defaults() {
        let entry = FeedEntry::new().with("id", "7");
        let product = builder().build(&entry, Utc::now()).unwrap();

        assert_eq!(product.name, "7");
        assert_eq!(product.price, 0.0);
        assert_eq!(product.discounted_price, 0.0);
        assert_eq!(product.currency, "TRY");
        assert_eq!(product.quantity, 0);
        assert_eq!(product.status, ProductStatus::Inactive);
        assert!(product.colors.is_empty());
        assert!(product.images.is_empty());
        assert!(product.facts.is_empty());
    }

    #[test]
    fn test_discount_falls_back_to_price() {
        let entry = FeedEntry::new()
            .with("id", "8")
            .with("price", "250")
            .with("discounted_price", "0");
        let product = builder().build(&entry, Utc::now()).unwrap();
        assert_eq!(product.discounted_price, 250.0);
        assert!(!product.has_discount());
    }

    #[test]
    fn test_unparsable_price_is_an_error() {
        let entry = FeedEntry::new().with("id", "9").with("price", "ask in store");
        let err = builder().build(&entry, Utc::now()).unwrap_err();
        assert!(matches!(err, ParsingError::InvalidPrice { ref field, .. } if field == "price"));
    }

    #[test]
    fn test_negative_price_is_an_error() {
        let entry = FeedEntry::new()
            .with("id", "12")
            .with("price", "100")
            .with("discounted_price", "-20 TL");
        let err = builder().build(&entry, Utc::now()).unwrap_err();
        assert!(
            matches!(err, ParsingError::InvalidPrice { ref field, .. } if field == "discounted_price")
        );
    }

    #[test]
    fn test_currency_element_wins_over_price_unit() {
        let entry = FeedEntry::new()
            .with("id", "10")
            .with("price", "45 TL")
            .with("currency", "eur");
        let product = builder().build(&entry, Utc::now()).unwrap();
        assert_eq!(product.currency, "EUR");

        let entry = FeedEntry::new().with("id", "11").with("price", "$45");
        assert_eq!(builder().build(&entry, Utc::now()).unwrap().currency, "USD");
    }

    #[test]
    fn test_field_aliases() {
        let entry = FeedEntry::new()
            .with("sku", "A-1")
            .with("title", "wool scarf")
            .with("stock", "0")
            .with("sale_price", "80");
        let product = builder().build(&entry, Utc::now()).unwrap();

        assert_eq!(product.product_id, "A-1");
        assert_eq!(product.name, "Wool Scarf");
        assert_eq!(product.status, ProductStatus::Inactive);
        assert_eq!(product.discounted_price, 80.0);
    }

    #[test]
    fn test_build_all_stops_at_first_failure() {
        let entries = vec![
            FeedEntry::new().with("id", "1"),
            FeedEntry::new().with("name", "orphan"),
            FeedEntry::new().with("id", "3"),
        ];
        assert!(builder().build_all(&entries, Utc::now()).is_err());
    }
}
