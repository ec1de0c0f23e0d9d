//! Infrastructure layer: feed access, parsing, configuration, logging and
//! persistence

pub mod config;
pub mod database_connection;
pub mod feed_reader;
pub mod http_client;
pub mod in_memory_repository;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod product_repository;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use database_connection::DatabaseConnection;
pub use feed_reader::{FeedEntry, FeedReader, FeedSource};
pub use http_client::{HttpClient, HttpClientConfig};
pub use in_memory_repository::InMemoryProductRepository;
pub use logging::{get_log_directory, init_logging, init_logging_with_config};
pub use parsing::{ParsingError, ParsingResult, ProductBuilder};
pub use product_repository::MongoProductRepository;
