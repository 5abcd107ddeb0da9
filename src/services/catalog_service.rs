//! Catalog gateway logic: query normalisation, pagination math and
//! detail aggregation on top of [`JikanClient`].

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::clients::jikan::{CatalogError, JikanClient, UpstreamPagination};
use crate::config::CatalogConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogQuery {
    pub page: u32,
    pub limit: u32,
    pub q: Option<String>,
}

/// Pagination block returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub total_items: Option<u64>,
    pub has_next: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogSearchResult {
    pub data: Vec<Value>,
    pub pagination: PageInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimeDetails {
    pub anime: Option<Value>,
    pub characters: Option<Value>,
    pub statistics: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopAnime {
    pub items: Vec<Value>,
    pub total: usize,
}

/// Parses a positive integer, falling back when the value is missing,
/// unparsable or below 1.
fn positive_or(raw: Option<&str>, fallback: u32) -> u32 {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
        .map_or(fallback, |v| u32::try_from(v).unwrap_or(u32::MAX))
}

#[must_use]
pub fn normalize_page(raw: Option<&str>) -> u32 {
    positive_or(raw, 1)
}

#[must_use]
pub fn normalize_limit(raw: Option<&str>, default_limit: u32, max_limit: u32) -> u32 {
    positive_or(raw, default_limit).min(max_limit.max(1))
}

/// Derives the client-facing pagination block from the upstream one.
///
/// The last page is the upstream `last_visible_page` when present, else it
/// is derived from the item total, else 1.
#[must_use]
pub fn compute_pagination(
    page: u32,
    limit: u32,
    upstream: Option<&UpstreamPagination>,
) -> PageInfo {
    let total_items = upstream.and_then(|p| p.items.as_ref()).and_then(|i| i.total);

    let computed_last = upstream
        .and_then(|p| p.last_visible_page)
        .unwrap_or_else(|| match total_items {
            Some(total) if total > 0 && limit > 0 => {
                u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
            }
            _ => 1,
        });

    let has_next = upstream.is_some_and(|p| p.has_next_page) || page < computed_last;

    PageInfo {
        page,
        limit,
        total_pages: computed_last,
        total_items,
        has_next,
    }
}

pub struct CatalogService {
    client: Arc<JikanClient>,
    config: CatalogConfig,
}

impl CatalogService {
    #[must_use]
    pub const fn new(client: Arc<JikanClient>, config: CatalogConfig) -> Self {
        Self { client, config }
    }

    #[must_use]
    pub fn query(&self, page: Option<&str>, limit: Option<&str>, q: Option<&str>) -> CatalogQuery {
        CatalogQuery {
            page: normalize_page(page),
            limit: normalize_limit(limit, self.config.default_limit, self.config.max_limit),
            q: q.map(str::trim)
                .filter(|q| !q.is_empty())
                .map(ToString::to_string),
        }
    }

    pub async fn search(&self, query: &CatalogQuery) -> Result<CatalogSearchResult, CatalogError> {
        let page = self
            .client
            .search(query.page, query.limit, query.q.as_deref())
            .await?;

        let pagination = compute_pagination(query.page, query.limit, page.pagination.as_ref());

        debug!(
            page = query.page,
            limit = query.limit,
            items = page.data.len(),
            total_pages = pagination.total_pages,
            "Catalog search"
        );

        Ok(CatalogSearchResult {
            data: page.data,
            pagination,
        })
    }

    /// Fetches the three parts of a detail view concurrently. The first
    /// failure aborts the whole view.
    pub async fn details(&self, mal_id: i32) -> Result<AnimeDetails, CatalogError> {
        let (anime, characters, statistics) = tokio::try_join!(
            self.client.anime(mal_id),
            self.client.characters(mal_id),
            self.client.statistics(mal_id),
        )?;

        Ok(AnimeDetails {
            anime,
            characters,
            statistics,
        })
    }

    pub async fn top(&self, limit: Option<&str>) -> Result<TopAnime, CatalogError> {
        let limit = normalize_limit(limit, self.config.top_default_limit, self.config.max_limit);
        let page = self.client.top(limit).await?;

        Ok(TopAnime {
            total: page.data.len(),
            items: page.data,
        })
    }
}
