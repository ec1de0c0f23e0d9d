//! HTTP client for downloading remote catalog feeds

use anyhow::{Context, Result, anyhow};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::infrastructure::config::FeedConfig;

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl HttpClientConfig {
    pub fn from_feed_config(feed: &FeedConfig) -> Self {
        Self {
            timeout_seconds: feed.request_timeout_seconds,
            user_agent: feed.user_agent.clone(),
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_feed_config(&FeedConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn with_config(config: &HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// Download a feed body. Non-2xx responses are errors; nothing is retried.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        info!("🌐 Downloading feed: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("Feed request to {} returned HTTP {}", url, status));
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read feed body from {url}"))?;

        debug!("Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
