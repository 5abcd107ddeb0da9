use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState};
use crate::clients::jikan::CatalogError;
use crate::services::catalog_service::{AnimeDetails, CatalogSearchResult, TopAnime};

/// Raw query values. Bad numbers fall back to defaults instead of failing.
#[derive(Debug, Deserialize)]
pub struct CatalogParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopParams {
    pub limit: Option<String>,
}

/// GET /catalog?page=&limit=&q=
pub async fn search_catalog(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<ApiResponse<CatalogSearchResult>>, ApiError> {
    let catalog = state.catalog_service();
    let query = catalog.query(
        params.page.as_deref(),
        params.limit.as_deref(),
        params.q.as_deref(),
    );

    let result = catalog.search(&query).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// GET /catalog/{id}
/// Anime, characters and statistics in one payload
pub async fn get_catalog_anime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<AnimeDetails>>, ApiError> {
    let id = validate_id(&id, "anime")?;

    let details = state
        .catalog_service()
        .details(id)
        .await
        .map_err(|e| match e {
            CatalogError::Status { status, .. } => {
                tracing::warn!(mal_id = id, upstream_status = status, "Catalog detail failed");
                ApiError::unavailable("catalog service unreachable")
            }
            other => ApiError::from(other),
        })?;

    Ok(Json(ApiResponse::success(details)))
}

/// GET /catalog/top?limit=
pub async fn get_top(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TopParams>,
) -> Result<Json<ApiResponse<TopAnime>>, ApiError> {
    let top = state.catalog_service().top(params.limit.as_deref()).await?;
    Ok(Json(ApiResponse::success(top)))
}
