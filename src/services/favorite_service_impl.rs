//! `SeaORM` implementation of the `FavoriteService` trait.

use std::collections::BTreeMap;

use crate::db::Store;
use crate::domain::{FavoriteId, WatchStatus};
use crate::models::favorite::{Favorite, FavoriteInput, FavoritePatch, StatusCounts};
use crate::services::favorite_service::{
    FavoriteError, FavoriteService, validate_input, validate_rating,
};
use async_trait::async_trait;
use tracing::{debug, info};

pub struct SeaOrmFavoriteService {
    store: Store,
}

impl SeaOrmFavoriteService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl FavoriteService for SeaOrmFavoriteService {
    async fn add_or_update(
        &self,
        user_id: i32,
        input: FavoriteInput,
    ) -> Result<Favorite, FavoriteError> {
        validate_input(&input)?;

        let favorite = self.store.upsert_favorite(user_id, &input).await?;

        info!(
            user_id,
            mal_id = favorite.mal_id,
            favorite_id = favorite.id,
            status = %favorite.status,
            "Saved favorite: {}",
            favorite.title
        );
        metrics::counter!("favorites_saved_total").increment(1);

        Ok(favorite)
    }

    async fn list(
        &self,
        user_id: i32,
        status: Option<WatchStatus>,
    ) -> Result<Vec<Favorite>, FavoriteError> {
        Ok(self.store.list_favorites(user_id, status).await?)
    }

    async fn get(&self, user_id: i32, id: FavoriteId) -> Result<Favorite, FavoriteError> {
        self.store
            .get_favorite(user_id, id)
            .await?
            .ok_or(FavoriteError::NotFound(id))
    }

    async fn update_status(
        &self,
        user_id: i32,
        id: FavoriteId,
        status: WatchStatus,
    ) -> Result<Favorite, FavoriteError> {
        self.update(
            user_id,
            id,
            FavoritePatch {
                status: Some(status),
                user_rating: None,
            },
        )
        .await
    }

    async fn update(
        &self,
        user_id: i32,
        id: FavoriteId,
        patch: FavoritePatch,
    ) -> Result<Favorite, FavoriteError> {
        if patch.is_empty() {
            return Err(FavoriteError::Validation(
                "Nothing to update: provide status or userRating".to_string(),
            ));
        }

        if let Some(Some(rating)) = patch.user_rating {
            validate_rating(rating)?;
        }

        let updated = self
            .store
            .update_favorite(user_id, id, &patch)
            .await?
            .ok_or(FavoriteError::NotFound(id))?;

        debug!(user_id, favorite_id = id.value(), status = %updated.status, "Updated favorite");

        Ok(updated)
    }

    async fn remove(&self, user_id: i32, id: FavoriteId) -> Result<(), FavoriteError> {
        if !self.store.remove_favorite(user_id, id).await? {
            return Err(FavoriteError::NotFound(id));
        }

        info!(user_id, favorite_id = id.value(), "Removed favorite");
        Ok(())
    }

    async fn stats(&self, user_id: i32) -> Result<StatusCounts, FavoriteError> {
        Ok(self.store.favorite_status_counts(user_id).await?)
    }

    async fn statuses(&self, user_id: i32) -> Result<BTreeMap<i32, WatchStatus>, FavoriteError> {
        Ok(self
            .store
            .favorite_statuses(user_id)
            .await?
            .into_iter()
            .collect())
    }
}
