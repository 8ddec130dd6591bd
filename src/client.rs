//! HTTP client for the history server.

use log::debug;
use reqwest::Client;

use crate::error::Result;
use crate::service::HealthResponse;
use crate::types::{ChannelId, Sample};

/// Thin reqwest wrapper over `GET /telemetry/{ids}` and `GET /health`.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    base_url: String,
    client: Client,
}

impl HistoryClient {
    /// `base_url` like `http://localhost:8081` (a trailing slash is fine).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Samples for `ids` with `start < timestamp < end`.
    pub async fn query(&self, ids: &[ChannelId], start: f64, end: f64) -> Result<Vec<Sample>> {
        let url = self.telemetry_url(ids);
        debug!("GET {} start={} end={}", url, start, end);

        let samples = self
            .client
            .get(&url)
            .query(&[("start", start.to_string()), ("end", end.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Sample>>()
            .await?;
        Ok(samples)
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);
        let health = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<HealthResponse>()
            .await?;
        Ok(health)
    }

    fn telemetry_url(&self, ids: &[ChannelId]) -> String {
        let joined = ids
            .iter()
            .map(ChannelId::as_str)
            .collect::<Vec<_>>()
            .join(",");
        format!("{}/telemetry/{}", self.base_url, joined)
    }
}
