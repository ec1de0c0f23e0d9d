// Database connection management
// This module handles MongoDB connections using the official driver

use anyhow::{Context, Result};
use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use std::time::Duration;
use tracing::info;

use crate::infrastructure::config::DatabaseConfig;

pub struct DatabaseConnection {
    client: Client,
    database: Database,
    collection_name: String,
}

impl DatabaseConnection {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(&config.uri)
            .await
            .context("Invalid MongoDB connection string")?;
        options.app_name = Some(config.app_name.clone());
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_seconds));

        let client = Client::with_options(options).context("Failed to create MongoDB client")?;
        let database = client.database(&config.database);

        Ok(Self {
            client,
            database,
            collection_name: config.collection.clone(),
        })
    }

    /// Connect and verify the server answers
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let connection = Self::new(config).await?;
        connection.ping().await?;
        info!(
            "🗄️ Connected to MongoDB database '{}' (collection '{}')",
            config.database, config.collection
        );
        Ok(connection)
    }

    pub async fn ping(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .context("MongoDB did not answer ping")?;
        Ok(())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Handle on the product collection
    pub fn collection(&self) -> Collection<Document> {
        self.database.collection::<Document>(&self.collection_name)
    }
}
