/*!
 * Remote dataset rows.
 *
 * [`HubClient`] pages through the Hugging Face datasets-server API
 * (`/splits` then `/rows`) and concatenates every split of the selected
 * configuration, in the order the server lists them.
 */

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use super::Sample;
use super::registry::DatasetInfo;
use crate::app_config::HubConfig;
use crate::errors::DatasetError;
use crate::providers::http_client;

/// Anything that can produce the full ordered sample list of a dataset
#[async_trait]
pub trait DatasetSource: Send + Sync {
    /// Fetch every sample of the dataset, all splits concatenated
    async fn fetch_all(&self, info: &DatasetInfo) -> Result<Vec<Sample>, DatasetError>;
}

/// One split of a dataset configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SplitEntry {
    /// Configuration (subset) name
    pub config: String,
    /// Split name, e.g. `train`
    pub split: String,
}

#[derive(Debug, Deserialize)]
struct SplitsResponse {
    splits: Vec<SplitEntry>,
}

/// One row as returned by `/rows`
#[derive(Debug, Deserialize)]
pub struct RowEntry {
    /// Position of the row within its split
    pub row_idx: usize,
    /// The record itself
    pub row: Sample,
    /// Cells the server shortened
    #[serde(default)]
    pub truncated_cells: Vec<String>,
}

/// One page of rows
#[derive(Debug, Deserialize)]
pub struct RowsPage {
    /// Rows of the page
    pub rows: Vec<RowEntry>,
    /// Total number of rows in the split
    pub num_rows_total: usize,
}

struct RequestFailure {
    retryable: bool,
    message: String,
}

/// Client for the Hugging Face datasets-server API
#[derive(Debug, Clone)]
pub struct HubClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
    page_size: usize,
    retry_count: u32,
    retry_backoff_ms: u64,
}

impl HubClient {
    /// Create a client for the given API base URL
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: http_client(timeout),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: None,
            page_size: 100,
            retry_count: 3,
            retry_backoff_ms: 1000,
        }
    }

    /// Create a client from the `hub` configuration section
    pub fn from_config(config: &HubConfig) -> Self {
        let mut client = Self::new(&config.endpoint, Duration::from_secs(config.timeout_secs))
            .with_page_size(config.page_size)
            .with_retry(config.retry_count, config.retry_backoff_ms);
        client.token = config.token();
        client
    }

    /// Send this bearer token with every request
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Rows requested per page, clamped to the server limit
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, 100);
        self
    }

    /// Retry policy for failed requests
    pub fn with_retry(mut self, retry_count: u32, retry_backoff_ms: u64) -> Self {
        self.retry_count = retry_count;
        self.retry_backoff_ms = retry_backoff_ms;
        self
    }

    /// List the splits of a dataset, optionally restricted to one configuration
    pub async fn splits(&self, dataset: &str, config: Option<&str>) -> Result<Vec<SplitEntry>, DatasetError> {
        let mut query = vec![("dataset", dataset.to_string())];
        if let Some(config) = config {
            query.push(("config", config.to_string()));
        }
        let response: SplitsResponse = self.get_json("splits", &query).await?;
        Ok(response.splits)
    }

    /// Fetch one page of rows
    pub async fn rows_page(
        &self,
        dataset: &str,
        split: &SplitEntry,
        offset: usize,
    ) -> Result<RowsPage, DatasetError> {
        let query = [
            ("dataset", dataset.to_string()),
            ("config", split.config.clone()),
            ("split", split.split.clone()),
            ("offset", offset.to_string()),
            ("length", self.page_size.to_string()),
        ];
        self.get_json("rows", &query).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, DatasetError> {
        let url = Url::parse_with_params(&format!("{}/{}", self.endpoint, path), query)
            .map_err(|e| DatasetError::Download(format!("Invalid datasets-server URL: {}", e)))?;

        let mut attempt: u32 = 0;
        loop {
            match self.try_get(&url).await {
                Ok(value) => return Ok(value),
                Err(failure) if failure.retryable && attempt < self.retry_count => {
                    let delay = self.retry_backoff_ms.saturating_mul(1u64 << attempt.min(16));
                    warn!(
                        "Request to {} failed ({}), retrying in {}ms ({}/{})",
                        path, failure.message, delay, attempt + 1, self.retry_count
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(failure) => return Err(DatasetError::Download(failure.message)),
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(&self, url: &Url) -> Result<T, RequestFailure> {
        debug!("GET {}", url);
        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| RequestFailure {
            retryable: true,
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestFailure {
                retryable: status.is_server_error() || status.as_u16() == 429,
                message: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        response.json::<T>().await.map_err(|e| RequestFailure {
            retryable: false,
            message: format!("Unexpected datasets-server response: {}", e),
        })
    }
}

#[async_trait]
impl DatasetSource for HubClient {
    async fn fetch_all(&self, info: &DatasetInfo) -> Result<Vec<Sample>, DatasetError> {
        let entries = self.splits(info.huggingface_path, info.config_name).await?;
        let config = match info.config_name {
            Some(config) => config.to_string(),
            None => entries
                .first()
                .map(|entry| entry.config.clone())
                .ok_or_else(|| DatasetError::Download(format!("{} has no splits", info.huggingface_path)))?,
        };

        let mut samples = Vec::new();
        for split in entries.iter().filter(|entry| entry.config == config) {
            let start = samples.len();
            let mut offset = 0;
            loop {
                let page = self.rows_page(info.huggingface_path, split, offset).await?;
                if page.rows.is_empty() {
                    break;
                }
                offset += page.rows.len();
                for entry in page.rows {
                    if !entry.truncated_cells.is_empty() {
                        return Err(DatasetError::Download(format!(
                            "row {} of split '{}' of {} was truncated by the server (cells: {})",
                            entry.row_idx,
                            split.split,
                            info.huggingface_path,
                            entry.truncated_cells.join(", ")
                        )));
                    }
                    samples.push(entry.row);
                }
                if offset >= page.num_rows_total {
                    break;
                }
            }
            info!("Fetched {} rows from split '{}'", samples.len() - start, split.split);
        }

        Ok(samples)
    }
}
