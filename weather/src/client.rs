//! Weather data source backed by the AMap live weather API

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// AMap live weather endpoint
pub const DEFAULT_ENDPOINT: &str = "https://restapi.amap.com/v3/weather/weatherInfo";

/// User agent sent with every lookup
pub const USER_AGENT: &str = "weather-app/1.0";

/// Upper bound for one lookup
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Something that can look up today's weather for a city.
///
/// Failures are not errors here: they come back as an `{"error": "..."}`
/// payload so the tool still answers with readable text.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, city: &str) -> Value;
}

/// HTTP client for the AMap weather API
pub struct AmapClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AmapClient {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(endpoint, api_key, REQUEST_TIMEOUT)
    }

    /// Like [`AmapClient::new`] with a custom bound for each lookup
    pub fn with_timeout(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl WeatherSource for AmapClient {
    async fn fetch(&self, city: &str) -> Value {
        debug!(city, endpoint = %self.endpoint, "requesting live weather");

        let response = match self
            .http
            .get(&self.endpoint)
            .query(&[("city", city), ("key", self.api_key.as_str())])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(city, error = %e, "weather request failed");
                return json!({ "error": format!("请求失败: {}", e) });
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(city, status = status.as_u16(), "weather API returned an error status");
            return json!({ "error": format!("HTTP error: {}", status.as_u16()) });
        }

        match response.json::<Value>().await {
            Ok(data) => data,
            Err(e) => {
                warn!(city, error = %e, "weather API returned an unreadable body");
                json!({ "error": format!("请求失败: {}", e) })
            }
        }
    }
}
