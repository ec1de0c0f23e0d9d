//! Configuration infrastructure
//!
//! Settings are resolved in layers, later layers winning:
//! 1. Built-in defaults (the `defaults` module)
//! 2. Optional config file (JSON/TOML/YAML, picked by extension)
//! 3. Environment variables: `CATALOG_SYNC__<SECTION>__<KEY>`
//! 4. Command line flags (applied by the binary)

#![allow(clippy::derivable_impls)]

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Configuration validation failed: {message}")]
    Validation { message: String },
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub feed: FeedConfig,
    pub database: DatabaseConfig,
    pub normalization: NormalizationConfig,
    pub description: DescriptionLabels,
    pub logging: LoggingConfig,
}

/// Where the catalog feed comes from and how its entries are laid out
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Local path or http(s) URL of the XML feed
    pub source: Option<String>,

    /// Element that wraps a single product entry
    pub product_element: String,

    /// Timeout for remote feed downloads
    pub request_timeout_seconds: u64,

    pub user_agent: String,

    /// Element names recognized for each product field
    pub fields: FieldMapping,
}

/// Element name aliases per product field, matched case-insensitively.
///
/// Image aliases also match numbered variants (`image1`, `image2`, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldMapping {
    pub id: Vec<String>,
    pub name: Vec<String>,
    pub color: Vec<String>,
    pub price: Vec<String>,
    pub discounted_price: Vec<String>,
    pub currency: Vec<String>,
    pub product_type: Vec<String>,
    pub series: Vec<String>,
    pub season: Vec<String>,
    pub quantity: Vec<String>,
    pub description: Vec<String>,
    pub image: Vec<String>,
}

/// Destination document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub app_name: String,
    pub server_selection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizationConfig {
    /// Currency used when neither the feed nor the price text names one
    pub default_currency: String,
}

/// Label aliases that introduce each fact inside a description
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptionLabels {
    pub fabric: Vec<String>,
    pub model_measurements: Vec<String>,
    pub product_measurements: Vec<String>,
    pub product_info: Vec<String>,
    pub model_on_body: Vec<String>,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted file logs
    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    /// Log directory; defaults to `logs/` next to the executable
    pub log_dir: Option<PathBuf>,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "mongodb": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            feed: FeedConfig::default(),
            database: DatabaseConfig::default(),
            normalization: NormalizationConfig::default(),
            description: DescriptionLabels::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source: None,
            product_element: defaults::PRODUCT_ELEMENT.to_string(),
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: defaults::USER_AGENT.to_string(),
            fields: FieldMapping::default(),
        }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            id: owned(&["id", "product_id", "productid", "sku", "urun_id"]),
            name: owned(&["name", "title", "product_name", "urun_adi"]),
            color: owned(&["color", "colors", "colour", "renk"]),
            price: owned(&["price", "list_price", "fiyat"]),
            discounted_price: owned(&[
                "discounted_price",
                "sale_price",
                "discount_price",
                "indirimli_fiyat",
            ]),
            currency: owned(&["currency", "currency_unit", "para_birimi"]),
            product_type: owned(&["product_type", "type", "category", "urun_tipi"]),
            series: owned(&["series", "collection", "seri"]),
            season: owned(&["season", "sezon"]),
            quantity: owned(&["quantity", "stock", "qty", "stok"]),
            description: owned(&["description", "details", "aciklama"]),
            image: owned(&["image", "images", "picture", "resim"]),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            uri: defaults::MONGODB_URI.to_string(),
            database: defaults::DATABASE_NAME.to_string(),
            collection: defaults::COLLECTION_NAME.to_string(),
            app_name: defaults::APP_NAME.to_string(),
            server_selection_timeout_seconds: defaults::SERVER_SELECTION_TIMEOUT_SECONDS,
        }
    }
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            default_currency: defaults::DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl Default for DescriptionLabels {
    fn default() -> Self {
        Self {
            fabric: owned(&["Fabric", "Material", "Kumaş", "Kumaş Bilgisi", "Materyal"]),
            model_measurements: owned(&[
                "Model Measurements",
                "Model Size",
                "Manken Ölçüleri",
                "Model Ölçüleri",
            ]),
            product_measurements: owned(&[
                "Product Measurements",
                "Measurements",
                "Ürün Ölçüleri",
                "Ölçüler",
            ]),
            product_info: owned(&[
                "Product Info",
                "Product Information",
                "Ürün Bilgisi",
                "Ürün Özellikleri",
            ]),
            model_on_body: owned(&[
                "Model is wearing",
                "Size worn by model",
                "Mankenin Üzerindeki Beden",
                "Mankenin Üzerindeki",
            ]),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            max_files: defaults::LOG_MAX_FILES,
            auto_cleanup_logs: defaults::LOG_AUTO_CLEANUP,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("mongodb".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("catalog_sync_lib".to_string(), defaults::LOG_LEVEL.to_string());
                filters
            },
        }
    }
}

impl AppConfig {
    /// Resolve defaults, an optional config file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path.to_path_buf()));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("database.uri", self.database.uri.as_str()),
            ("database.database", self.database.database.as_str()),
            ("database.collection", self.database.collection.as_str()),
            ("feed.product_element", self.feed.product_element.as_str()),
            ("normalization.default_currency", self.normalization.default_currency.as_str()),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation {
                    message: format!("{key} must not be empty"),
                });
            }
        }

        let labels = [
            ("description.fabric", &self.description.fabric),
            ("description.model_measurements", &self.description.model_measurements),
            ("description.product_measurements", &self.description.product_measurements),
            ("description.product_info", &self.description.product_info),
            ("description.model_on_body", &self.description.model_on_body),
            ("feed.fields.id", &self.feed.fields.id),
        ];
        for (key, aliases) in labels {
            if aliases.iter().all(|alias| alias.trim().is_empty()) {
                return Err(ConfigError::Validation {
                    message: format!("{key} needs at least one non-empty alias"),
                });
            }
        }

        Ok(())
    }
}

/// Locates and writes the per-user configuration file
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::APP_NAME);

        Ok(config_dir)
    }

    /// Configuration manager for the default per-user location
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load the layered configuration, using the managed file when it exists
    pub fn load_config(&self) -> Result<AppConfig> {
        let file = self.config_path.exists().then_some(self.config_path.as_path());
        let config = AppConfig::load(file)
            .with_context(|| format!("Failed to load configuration from {:?}", self.config_path))?;
        Ok(config)
    }

    /// Save configuration to file as pretty JSON
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Write the default configuration unless a file is already present
    pub async fn initialize_default(&self, overwrite: bool) -> Result<AppConfig> {
        if self.config_path.exists() && !overwrite {
            info!("Configuration already exists at {:?}; leaving it untouched", self.config_path);
            return self.load_config();
        }

        let default_config = AppConfig::default();
        self.save_config(&default_config).await?;
        info!("✅ Default configuration written");
        Ok(default_config)
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Default configuration values
pub mod defaults {
    pub const APP_NAME: &str = "catalog-sync";

    pub const CONFIG_FILE_NAME: &str = "catalog_sync_config.json";

    /// Prefix for environment overrides, e.g. `CATALOG_SYNC__DATABASE__URI`
    pub const ENV_PREFIX: &str = "CATALOG_SYNC";

    pub const PRODUCT_ELEMENT: &str = "product";

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 60;

    pub const USER_AGENT: &str = "catalog-sync/0.1 (catalog feed importer)";

    pub const MONGODB_URI: &str = "mongodb://localhost:27017";

    pub const DATABASE_NAME: &str = "catalog";

    pub const COLLECTION_NAME: &str = "products";

    pub const SERVER_SELECTION_TIMEOUT_SECONDS: u64 = 10;

    pub const DEFAULT_CURRENCY: &str = "TRY";

    pub const LOG_LEVEL: &str = "info";

    pub const LOG_JSON_FORMAT: bool = false;

    pub const LOG_CONSOLE_OUTPUT: bool = true;

    pub const LOG_FILE_OUTPUT: bool = true;

    pub const LOG_MAX_FILES: u32 = 10;

    pub const LOG_AUTO_CLEANUP: bool = true;

    pub const LOG_FILE_NAME: &str = "catalog-sync.log";
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.database.collection, "products");
        assert_eq!(config.feed.product_element, "product");
    }

    #[test]
    fn test_dependency_log_filters_default_to_warn() {
        let filters = LoggingConfig::default().module_filters;
        for module in ["mongodb", "reqwest", "hyper", "html5ever"] {
            assert_eq!(filters.get(module).map(String::as_str), Some("warn"), "{module}");
        }
    }

    #[test]
    fn test_validation_rejects_empty_collection() {
        let mut config = AppConfig::default();
        config.database.collection = "  ".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("database.collection"));
    }

    #[test]
    fn test_validation_rejects_empty_label_list() {
        let mut config = AppConfig::default();
        config.description.fabric = vec![String::new()];

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_merges_file_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{ "database": {{ "database": "shop", "collection": "items" }},
                 "normalization": {{ "default_currency": "EUR" }} }}"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.database.database, "shop");
        assert_eq!(config.database.collection, "items");
        assert_eq!(config.normalization.default_currency, "EUR");
        // Untouched keys keep their defaults
        assert_eq!(config.database.uri, defaults::MONGODB_URI);
        assert!(!config.description.fabric.is_empty());
    }

    #[tokio::test]
    async fn test_config_manager_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("nested").join("config.json"));

        manager.initialize_default(false).await.unwrap();
        assert!(manager.config_path().exists());

        let loaded = manager.load_config().unwrap();
        assert_eq!(loaded.database.database, defaults::DATABASE_NAME);
    }
}
