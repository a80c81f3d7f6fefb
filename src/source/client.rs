use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::source::models::{SourceSensor, SourceStation};
use crate::source::WeatherSource;

pub struct HttpWeatherSource {
    http_client: Client,
    base_url: String,
}

impl HttpWeatherSource {
    /// Build a client for the configured source.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the HTTP client cannot be constructed.
    pub fn new(config: &Config) -> AppResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.source_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: config.source_base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Source(format!("Request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Source(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::Source(format!("Failed to get response text: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                url,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse weather source response"
            );
            AppError::Source(format!("Failed to parse response: {e}"))
        })
    }
}

#[async_trait]
impl WeatherSource for HttpWeatherSource {
    async fn fetch_all_stations(&self) -> AppResult<Vec<SourceStation>> {
        let url = format!("{}/stations", self.base_url);
        self.get_json(&url).await
    }

    async fn fetch_station_measurements(&self, station_id: i32) -> AppResult<Vec<SourceSensor>> {
        let url = format!("{}/stations/{station_id}/measurements", self.base_url);
        self.get_json(&url).await
    }
}
