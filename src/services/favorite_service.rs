//! Domain service for a user's favorites list.
//!
//! Every operation is scoped to the calling user. A favorite owned by
//! someone else is indistinguishable from a missing one.

use std::collections::BTreeMap;

use crate::domain::{FavoriteId, WatchStatus};
use crate::models::favorite::{Favorite, FavoriteInput, FavoritePatch, StatusCounts};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FavoriteError {
    #[error("Favorite not found: {0}")]
    NotFound(FavoriteId),

    #[error("Invalid favorite data: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sea_orm::DbErr> for FavoriteError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for FavoriteError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

pub const MIN_USER_RATING: i32 = 1;
pub const MAX_USER_RATING: i32 = 10;

#[async_trait::async_trait]
pub trait FavoriteService: Send + Sync {
    /// Adds a title to the list, or refreshes the stored copy when the user
    /// already has it. The row id, creation time and personal rating survive
    /// a refresh.
    ///
    /// # Errors
    ///
    /// - [`FavoriteError::Validation`] when the input is malformed
    /// - [`FavoriteError::Database`] on storage failures
    async fn add_or_update(
        &self,
        user_id: i32,
        input: FavoriteInput,
    ) -> Result<Favorite, FavoriteError>;

    /// Newest first, optionally filtered by status.
    async fn list(
        &self,
        user_id: i32,
        status: Option<WatchStatus>,
    ) -> Result<Vec<Favorite>, FavoriteError>;

    /// # Errors
    ///
    /// Returns [`FavoriteError::NotFound`] for unknown or foreign ids.
    async fn get(&self, user_id: i32, id: FavoriteId) -> Result<Favorite, FavoriteError>;

    async fn update_status(
        &self,
        user_id: i32,
        id: FavoriteId,
        status: WatchStatus,
    ) -> Result<Favorite, FavoriteError>;

    /// Applies a partial update.
    ///
    /// # Errors
    ///
    /// - [`FavoriteError::Validation`] for an empty patch or a rating outside 1..=10
    /// - [`FavoriteError::NotFound`] for unknown or foreign ids
    async fn update(
        &self,
        user_id: i32,
        id: FavoriteId,
        patch: FavoritePatch,
    ) -> Result<Favorite, FavoriteError>;

    async fn remove(&self, user_id: i32, id: FavoriteId) -> Result<(), FavoriteError>;

    async fn stats(&self, user_id: i32) -> Result<StatusCounts, FavoriteError>;

    /// Catalog id to status for every favorite, used to badge catalog pages.
    async fn statuses(&self, user_id: i32) -> Result<BTreeMap<i32, WatchStatus>, FavoriteError>;
}

/// Checks an add-or-update payload before it reaches storage.
pub fn validate_input(input: &FavoriteInput) -> Result<(), FavoriteError> {
    if input.mal_id.value() <= 0 {
        return Err(FavoriteError::Validation(
            "malId must be a positive integer".to_string(),
        ));
    }

    if input.title.trim().is_empty() {
        return Err(FavoriteError::Validation("title is required".to_string()));
    }

    if let Some(url) = input.url.as_deref() {
        let parsed = url::Url::parse(url)
            .map_err(|_| FavoriteError::Validation(format!("url is not a valid URL: {url}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FavoriteError::Validation(
                "url must use http or https".to_string(),
            ));
        }
    }

    if let Some(score) = input.score
        && !(score.is_finite() && (0.0..=10.0).contains(&score))
    {
        return Err(FavoriteError::Validation(
            "score must be between 0 and 10".to_string(),
        ));
    }

    Ok(())
}

pub fn validate_rating(rating: i32) -> Result<(), FavoriteError> {
    if (MIN_USER_RATING..=MAX_USER_RATING).contains(&rating) {
        Ok(())
    } else {
        Err(FavoriteError::Validation(format!(
            "userRating must be between {MIN_USER_RATING} and {MAX_USER_RATING}"
        )))
    }
}
