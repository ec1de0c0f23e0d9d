//! `catalog-sync` command line entry point

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use catalog_sync_lib::application::CatalogSyncService;
use catalog_sync_lib::domain::ProductRepository;
use catalog_sync_lib::infrastructure::config::{AppConfig, ConfigManager};
use catalog_sync_lib::infrastructure::logging::{init_logging_with_config, log_system_info};
use catalog_sync_lib::infrastructure::{
    DatabaseConnection, FeedSource, InMemoryProductRepository, MongoProductRepository,
    ProductBuilder,
};

#[derive(Debug, Parser)]
#[command(name = "catalog-sync", version, about = "Sync a product XML feed into MongoDB")]
struct Cli {
    /// Configuration file (JSON, TOML or YAML)
    #[arg(long, global = true, env = "CATALOG_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured log level
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read the feed and upsert every product
    Sync(SyncArgs),

    /// Write the default configuration file
    InitConfig {
        /// Destination; defaults to the per-user config directory
        #[arg(long)]
        path: Option<PathBuf>,

        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the resolved configuration as JSON
    ShowConfig,
}

#[derive(Debug, Args)]
struct SyncArgs {
    /// Feed file path or http(s) URL
    #[arg(long)]
    feed: Option<String>,

    #[arg(long)]
    mongo_uri: Option<String>,

    #[arg(long)]
    database: Option<String>,

    #[arg(long)]
    collection: Option<String>,

    /// Run the whole pipeline in memory and print the records instead of writing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::InitConfig { path, force } => init_config(path, force).await,
        Command::ShowConfig => {
            let config = load_config(cli.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Sync(args) => {
            let mut config = load_config(cli.config.as_deref())?;
            apply_overrides(&mut config, &args, cli.log_level.as_deref());
            config.validate()?;

            init_logging_with_config(&config.logging)?;
            log_system_info();
            sync(&config, &args).await
        }
    }
}

/// Explicit `--config` file, else the per-user file when present, else
/// defaults and environment only
fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = path {
        return AppConfig::load(Some(path))
            .with_context(|| format!("Failed to load configuration from {}", path.display()));
    }

    match ConfigManager::new() {
        Ok(manager) => manager.load_config(),
        Err(_) => Ok(AppConfig::load(None)?),
    }
}

fn apply_overrides(config: &mut AppConfig, args: &SyncArgs, log_level: Option<&str>) {
    if let Some(feed) = &args.feed {
        config.feed.source = Some(feed.clone());
    }
    if let Some(uri) = &args.mongo_uri {
        config.database.uri = uri.clone();
    }
    if let Some(database) = &args.database {
        config.database.database = database.clone();
    }
    if let Some(collection) = &args.collection {
        config.database.collection = collection.clone();
    }
    if let Some(level) = log_level {
        config.logging.level = level.to_string();
        config
            .logging
            .module_filters
            .insert("catalog_sync_lib".to_string(), level.to_string());
    }
}

async fn sync(config: &AppConfig, args: &SyncArgs) -> Result<()> {
    let source = config
        .feed
        .source
        .as_deref()
        .ok_or_else(|| anyhow!("No feed source: pass --feed or set feed.source"))?;
    let source = FeedSource::parse(source)?;
    let builder = ProductBuilder::from_config(config)?;

    if args.dry_run {
        info!("Dry run: records are kept in memory");
        let repository = Arc::new(InMemoryProductRepository::new());
        let service = CatalogSyncService::new(repository.clone(), builder, &config.feed);
        service.run(&source).await?;

        println!("{}", serde_json::to_string_pretty(&repository.all().await)?);
        return Ok(());
    }

    let connection = DatabaseConnection::connect(&config.database).await?;
    let repository = Arc::new(MongoProductRepository::new(&connection));
    let service = CatalogSyncService::new(repository.clone(), builder, &config.feed);
    let summary = service.run(&source).await?;

    let total = repository.count_products().await?;
    info!(
        "Collection '{}' now holds {} products ({} written this run)",
        config.database.collection,
        total,
        summary.written()
    );
    Ok(())
}

async fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new()?,
    };
    manager.initialize_default(force).await?;
    println!("{}", manager.config_path().display());
    Ok(())
}
