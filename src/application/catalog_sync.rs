//! Catalog synchronization use case
//!
//! One run reads the feed, builds every product and upserts them in feed
//! order. Building happens before any write, so a bad entry leaves the
//! store untouched; a failing upsert stops the run where it is.

#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::domain::product::Product;
use crate::domain::repositories::{ProductRepository, UpsertOutcome};
use crate::infrastructure::config::FeedConfig;
use crate::infrastructure::feed_reader::{FeedReader, FeedSource};
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};
use crate::infrastructure::parsing::ProductBuilder;

/// Counters reported at the end of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SyncSummary {
    /// Product entries found in the feed
    pub entries: usize,
    pub inserted: usize,
    pub updated: usize,
    pub duration: Duration,
}

impl SyncSummary {
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

pub struct CatalogSyncService {
    repository: Arc<dyn ProductRepository>,
    builder: ProductBuilder,
    reader: FeedReader,
    http_config: HttpClientConfig,
}

impl CatalogSyncService {
    pub fn new(
        repository: Arc<dyn ProductRepository>,
        builder: ProductBuilder,
        feed_config: &FeedConfig,
    ) -> Self {
        Self {
            repository,
            builder,
            reader: FeedReader::new(feed_config.product_element.clone()),
            http_config: HttpClientConfig::from_feed_config(feed_config),
        }
    }

    /// Full run against a file or URL feed
    pub async fn run(&self, source: &FeedSource) -> Result<SyncSummary> {
        let started = Instant::now();
        info!("🚀 Starting catalog sync from {}", source.describe());

        let xml = self.load_feed(source).await?;
        let mut summary = self.sync_document(&xml).await?;
        summary.duration = started.elapsed();

        info!(
            "✅ Catalog sync finished: {} entries, {} inserted, {} updated in {:.2?}",
            summary.entries, summary.inserted, summary.updated, summary.duration
        );
        Ok(summary)
    }

    /// Parse, build and upsert an already loaded feed document
    pub async fn sync_document(&self, xml: &str) -> Result<SyncSummary> {
        let started = Instant::now();
        let products = self.build_products(xml)?;

        let mut summary = SyncSummary {
            entries: products.len(),
            ..SyncSummary::default()
        };
        if products.is_empty() {
            warn!("Feed contains no product entries; nothing to write");
            summary.duration = started.elapsed();
            return Ok(summary);
        }

        self.repository
            .ensure_indexes()
            .await
            .context("Failed to prepare product store")?;

        for product in &products {
            match self.repository.upsert_product(product).await? {
                UpsertOutcome::Inserted => summary.inserted += 1,
                UpsertOutcome::Updated => summary.updated += 1,
            }
        }

        summary.duration = started.elapsed();
        Ok(summary)
    }

    /// Parse the feed and build every product without touching the store
    pub fn build_products(&self, xml: &str) -> Result<Vec<Product>> {
        let entries = self.reader.parse(xml).context("Failed to parse feed")?;
        let products = self
            .builder
            .build_all(&entries, Utc::now())
            .context("Failed to build products from feed")?;
        info!("Built {} products", products.len());
        Ok(products)
    }

    async fn load_feed(&self, source: &FeedSource) -> Result<String> {
        match source {
            FeedSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read feed file {}", path.display())),
            FeedSource::Url(url) => {
                let client = HttpClient::with_config(&self.http_config)?;
                client.fetch_text(url).await
            }
        }
    }
}
