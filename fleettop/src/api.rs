//! HTTP client for the dashboard API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::types::{DowntimeEvent, ServerSnapshot, SummaryResponse};

pub const SUMMARY_PATH: &str = "api/get_summary";
pub const EVENT_PATH: &str = "api/get_event_data";
pub const AVAILABILITY_PATH: &str = "api/get_availability_data";
pub const HISTORY_PATH: &str = "api/get_historical_data";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid base url: {0}")]
    InvalidUrl(String),
    #[error("request failed: {0}")]
    Network(String),
    #[error("HTTP error! status: {0}")]
    Status(StatusCode),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("request timed out")]
    Timeout,
}

impl FetchError {
    fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Parse(e.to_string())
        } else if let Some(code) = e.status() {
            FetchError::Status(code)
        } else {
            FetchError::Network(e.to_string())
        }
    }
}

/// Where the poller gets its data. Implemented by [`ApiClient`]; tests plug
/// in scripted sources.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn summary(&self) -> Result<Vec<ServerSnapshot>, FetchError>;
    async fn events(&self, machine: &str) -> Result<Vec<DowntimeEvent>, FetchError>;
    async fn availability(&self, machine: &str) -> Result<Vec<DowntimeEvent>, FetchError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base = parse_base_url(base_url)?;
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, path: &str, machine: Option<&str>) -> Result<Url, FetchError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        if let Some(name) = machine {
            url.query_pairs_mut().append_pair("server_name", name);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, FetchError> {
        debug!(%url, "GET");
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;
        if !res.status().is_success() {
            return Err(FetchError::Status(res.status()));
        }
        let body = res.bytes().await.map_err(FetchError::from_reqwest)?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Parse(e.to_string()))
    }

    pub async fn fetch_summary(&self) -> Result<Vec<ServerSnapshot>, FetchError> {
        let url = self.endpoint(SUMMARY_PATH, None)?;
        let s: SummaryResponse = self.get_json(url).await?;
        Ok(s.servers)
    }

    pub async fn fetch_event_data(&self, machine: &str) -> Result<Vec<DowntimeEvent>, FetchError> {
        let url = self.endpoint(EVENT_PATH, Some(machine))?;
        self.get_json(url).await
    }

    pub async fn fetch_availability_data(
        &self,
        machine: &str,
    ) -> Result<Vec<DowntimeEvent>, FetchError> {
        let url = self.endpoint(AVAILABILITY_PATH, Some(machine))?;
        self.get_json(url).await
    }

    /// Raw per-server history; its shape is owned by the API.
    pub async fn fetch_historical_data(
        &self,
        machine: &str,
    ) -> Result<serde_json::Value, FetchError> {
        let url = self.endpoint(HISTORY_PATH, Some(machine))?;
        self.get_json(url).await
    }
}

#[async_trait]
impl StatusSource for ApiClient {
    async fn summary(&self) -> Result<Vec<ServerSnapshot>, FetchError> {
        self.fetch_summary().await
    }

    async fn events(&self, machine: &str) -> Result<Vec<DowntimeEvent>, FetchError> {
        self.fetch_event_data(machine).await
    }

    async fn availability(&self, machine: &str) -> Result<Vec<DowntimeEvent>, FetchError> {
        self.fetch_availability_data(machine).await
    }
}

/// Accepts `http(s)://host[:port][/prefix]`; a trailing slash is added so
/// endpoint paths join under the prefix instead of replacing it.
pub fn parse_base_url(s: &str) -> Result<Url, FetchError> {
    let mut url = Url::parse(s.trim()).map_err(|e| FetchError::InvalidUrl(format!("{s}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "{s}: expected http:// or https://"
        )));
    }
    if !url.path().ends_with('/') {
        let p = format!("{}/", url.path());
        url.set_path(&p);
    }
    url.set_query(None);
    Ok(url)
}
