use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::retry::RetryPolicy;
use crate::config::CatalogConfig;

pub const JIKAN_API: &str = "https://api.jikan.moe/v4";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog API returned {status}")]
    Status { status: u16, body: String },

    #[error("catalog request failed: {0}")]
    Transport(String),

    #[error("failed to decode catalog response: {0}")]
    Decode(String),
}

/// `{ "data": ... }` envelope used by single-resource endpoints.
#[derive(Debug, Deserialize)]
struct JikanResponse {
    #[serde(default)]
    data: Option<Value>,
}

/// A list endpoint page. Items stay raw so the gateway passes every
/// catalog field through untouched.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Value>,
    #[serde(default)]
    pub pagination: Option<UpstreamPagination>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamPagination {
    pub last_visible_page: Option<u32>,
    #[serde(default)]
    pub has_next_page: bool,
    pub current_page: Option<u32>,
    pub items: Option<PaginationItems>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginationItems {
    pub count: Option<u32>,
    pub total: Option<u64>,
    pub per_page: Option<u32>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Typed view of a catalog entry for terminal output.
#[derive(Debug, Deserialize)]
pub struct MalAnime {
    pub mal_id: i32,
    pub title: String,
    pub title_english: Option<String>,
    pub episodes: Option<i32>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub anime_type: Option<String>,
    pub score: Option<f32>,
    pub year: Option<i32>,
    pub url: Option<String>,
}

#[derive(Clone)]
pub struct JikanClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl JikanClient {
    #[must_use]
    pub fn new(client: Client, base_url: &str, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            retry,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(concat!("animelist/", env!("CARGO_PKG_VERSION")))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build catalog HTTP client: {e}"))?;

        Ok(Self::new(
            client,
            &config.base_url,
            RetryPolicy::from_config(&config.retry),
        ))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, CatalogError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(url, attempt, "Catalog request");

            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    metrics::counter!("catalog_requests_total", "outcome" => "success")
                        .increment(1);
                    return response
                        .json::<T>()
                        .await
                        .map_err(|e| CatalogError::Decode(e.to_string()));
                }
                Ok(response) => {
                    let status = response.status();

                    if RetryPolicy::is_retryable(status) && self.retry.allows_another(attempt) {
                        let delay = self
                            .retry
                            .delay_for(attempt, RetryPolicy::retry_after(response.headers()));
                        warn!(
                            url,
                            attempt,
                            status = status.as_u16(),
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "Catalog busy, retrying"
                        );
                        metrics::counter!("catalog_retries_total").increment(1);
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    metrics::counter!("catalog_requests_total", "outcome" => "error").increment(1);
                    let body = response.text().await.unwrap_or_default();
                    return Err(CatalogError::Status {
                        status: status.as_u16(),
                        body,
                    });
                }
                Err(e) => {
                    if self.retry.allows_another(attempt) {
                        let delay = self.retry.delay_for(attempt, None);
                        warn!(url, attempt, error = %e, "Catalog request failed, retrying");
                        metrics::counter!("catalog_retries_total").increment(1);
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    metrics::counter!("catalog_requests_total", "outcome" => "error").increment(1);
                    return Err(CatalogError::Transport(e.to_string()));
                }
            }
        }
    }

    async fn get_data(&self, path: &str) -> Result<Option<Value>, CatalogError> {
        let response: JikanResponse = self.get_json(&self.endpoint(path)).await?;
        Ok(response.data)
    }

    /// `GET /anime?page=&limit=[&q=]`. An empty query browses the whole catalog.
    pub async fn search(
        &self,
        page: u32,
        limit: u32,
        query: Option<&str>,
    ) -> Result<CatalogPage, CatalogError> {
        let mut url = self.endpoint(&format!("anime?page={page}&limit={limit}"));
        if let Some(q) = query.map(str::trim).filter(|q| !q.is_empty()) {
            url.push_str("&q=");
            url.push_str(&urlencoding::encode(q));
        }

        self.get_json(&url).await
    }

    pub async fn anime(&self, mal_id: i32) -> Result<Option<Value>, CatalogError> {
        self.get_data(&format!("anime/{mal_id}")).await
    }

    pub async fn characters(&self, mal_id: i32) -> Result<Option<Value>, CatalogError> {
        self.get_data(&format!("anime/{mal_id}/characters")).await
    }

    pub async fn statistics(&self, mal_id: i32) -> Result<Option<Value>, CatalogError> {
        self.get_data(&format!("anime/{mal_id}/statistics")).await
    }

    /// Highest ranked titles, used for the dashboard preview.
    pub async fn top(&self, limit: u32) -> Result<CatalogPage, CatalogError> {
        self.get_json(&self.endpoint(&format!("top/anime?limit={limit}")))
            .await
    }

    /// Typed search for terminal output.
    pub async fn search_typed(&self, query: &str, limit: u32) -> Result<Vec<MalAnime>, CatalogError> {
        let page = self.search(1, limit, Some(query)).await?;

        page.data
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| CatalogError::Decode(e.to_string()))
            })
            .collect()
    }
}
