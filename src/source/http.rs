//! HTTP client for the stats service.
//!
//! ## Example
//!
//! ```rust,no_run
//! use statusdeck::source::{HttpClient, StatsClient};
//!
//! # tokio_test::block_on(async {
//! let client = HttpClient::builder()
//!     .base_url("http://127.0.0.1:8001")
//!     .build()
//!     .unwrap();
//!
//! let payload = client.fetch_stats().await.unwrap();
//! println!("{} events", payload.events.len());
//! # });
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde_json::Value;

use super::snapshot::{parse_day_events, RawEvent, StatsPayload};
use super::FetchError;

/// Anything that can answer the two endpoints the dashboard needs.
///
/// The poll loop and day fetch only see this trait, which keeps them
/// testable without a server.
#[async_trait]
pub trait StatsClient: Send + Sync {
    /// `GET {base}/stats`
    async fn fetch_stats(&self) -> Result<StatsPayload, FetchError>;

    /// `GET {base}/events?date=YYYY-MM-DD`
    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<RawEvent>, FetchError>;

    /// Short description for the status bar.
    fn description(&self) -> &str;
}

/// reqwest-backed [`StatsClient`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    description: String,
}

impl HttpClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let response = self.client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[async_trait]
impl StatsClient for HttpClient {
    async fn fetch_stats(&self) -> Result<StatsPayload, FetchError> {
        let url = format!("{}/stats", self.base_url);
        let body = self.get_json(&url, &[]).await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn fetch_day(&self, date: NaiveDate) -> Result<Vec<RawEvent>, FetchError> {
        let url = format!("{}/events", self.base_url);
        let query = [("date", date.format("%Y-%m-%d").to_string())];
        let body = self.get_json(&url, &query).await?;
        parse_day_events(body)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl HttpClientBuilder {
    /// Service root, e.g. `http://127.0.0.1:8001`. A trailing slash is ignored.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Per-request timeout enforced by the HTTP client itself.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<HttpClient, FetchError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| "http://127.0.0.1:8001".to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(2)))
            .build()
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        Ok(HttpClient {
            client,
            description: format!("http: {}", base_url),
            base_url,
        })
    }
}
