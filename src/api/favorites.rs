use axum::{
    Extension, Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::validation::{
    json_body, validate_id, validate_mal_id, validate_status, validate_status_filter,
    validate_title,
};
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::domain::{FavoriteId, MalId, WatchStatus};
use crate::models::favorite::{Favorite, FavoriteInput, FavoritePatch, StatusCounts};
use crate::services::AuthUser;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFavoriteRequest {
    #[serde(alias = "mal_id")]
    pub mal_id: Option<i64>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub url: Option<String>,
    pub synopsis: Option<String>,
    pub score: Option<f64>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFavoriteRequest {
    pub status: Option<String>,
    /// Absent leaves the rating alone, `null` clears it.
    #[serde(default, alias = "userRating", deserialize_with = "present_or_null")]
    pub user_rating: Option<Option<i32>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Blank optional strings are stored as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl CreateFavoriteRequest {
    fn into_input(self) -> Result<FavoriteInput, ApiError> {
        let mal_id = validate_mal_id(self.mal_id)?;
        let title = validate_title(self.title.as_deref())?;
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => WatchStatus::default(),
            Some(raw) => validate_status(raw)?,
        };

        Ok(FavoriteInput {
            mal_id: MalId::new(mal_id),
            title,
            image: non_blank(self.image),
            url: non_blank(self.url),
            synopsis: non_blank(self.synopsis),
            score: self.score,
            status,
        })
    }
}

/// POST /animes
/// Add a title to the caller's list, or refresh it if already there
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateFavoriteRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Favorite>>, ApiError> {
    let input = json_body(payload)?.into_input()?;
    let favorite = state
        .favorite_service()
        .add_or_update(user.id, input)
        .await?;

    Ok(Json(ApiResponse::success(favorite)))
}

/// GET /animes?status=
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Favorite>>>, ApiError> {
    let status = validate_status_filter(query.status.as_deref())?;
    let favorites = state.favorite_service().list(user.id, status).await?;
    Ok(Json(ApiResponse::success(favorites)))
}

/// GET /animes/stats
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<StatusCounts>>, ApiError> {
    let stats = state.favorite_service().stats(user.id).await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// GET /animes/statuses
pub async fn get_statuses(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ApiResponse<BTreeMap<i32, WatchStatus>>>, ApiError> {
    let statuses = state.favorite_service().statuses(user.id).await?;
    Ok(Json(ApiResponse::success(statuses)))
}

/// GET /animes/{id}
pub async fn get_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Favorite>>, ApiError> {
    let id = FavoriteId::new(validate_id(&id, "favorite")?);
    let favorite = state.favorite_service().get(user.id, id).await?;
    Ok(Json(ApiResponse::success(favorite)))
}

/// PATCH /animes/{id}/status
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Favorite>>, ApiError> {
    let id = FavoriteId::new(validate_id(&id, "favorite")?);
    let body = json_body(payload)?;
    let status = validate_status(
        body.status
            .as_deref()
            .ok_or_else(|| ApiError::validation("status is required"))?,
    )?;

    let favorite = state
        .favorite_service()
        .update_status(user.id, id, status)
        .await?;

    Ok(Json(ApiResponse::success(favorite)))
}

/// PATCH /animes/{id}
/// Partial update of status and/or personal rating
pub async fn update_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateFavoriteRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Favorite>>, ApiError> {
    let id = FavoriteId::new(validate_id(&id, "favorite")?);
    let body = json_body(payload)?;

    let patch = FavoritePatch {
        status: body.status.as_deref().map(validate_status).transpose()?,
        user_rating: body.user_rating,
    };

    let favorite = state.favorite_service().update(user.id, id, patch).await?;
    Ok(Json(ApiResponse::success(favorite)))
}

/// DELETE /animes/{id}
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let id = FavoriteId::new(validate_id(&id, "favorite")?);
    state.favorite_service().remove(user.id, id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(format!(
        "Favorite {id} removed"
    )))))
}
