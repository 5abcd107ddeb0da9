use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use tracing::warn;

use crate::domain::WatchStatus;
use crate::entities::{favorites, prelude::*};
use crate::models::favorite::{Favorite, FavoriteInput, FavoritePatch, StatusCounts};

pub struct FavoriteRepository {
    conn: DatabaseConnection,
}

impl FavoriteRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(model: favorites::Model) -> Favorite {
        let status = model.status.parse().unwrap_or_else(|_| {
            warn!(
                favorite_id = model.id,
                status = %model.status,
                "Unknown status stored for favorite, treating as to_watch"
            );
            WatchStatus::ToWatch
        });

        Favorite {
            id: model.id,
            mal_id: model.mal_id,
            title: model.title,
            image: model.image,
            url: model.url,
            synopsis: model.synopsis,
            score: model.score,
            status,
            user_rating: model.user_rating,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    async fn find_owned(&self, user_id: i32, id: i32) -> Result<Option<favorites::Model>> {
        Favorites::find_by_id(id)
            .filter(favorites::Column::UserId.eq(user_id))
            .one(&self.conn)
            .await
            .context("Failed to query favorite")
    }

    /// Inserts the favorite or, when the user already has this `mal_id`,
    /// overwrites its status and catalog metadata in place.
    pub async fn upsert(&self, user_id: i32, input: &FavoriteInput) -> Result<Favorite> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = favorites::ActiveModel {
            user_id: Set(user_id),
            mal_id: Set(input.mal_id.value()),
            title: Set(input.title.clone()),
            image: Set(input.image.clone()),
            url: Set(input.url.clone()),
            synopsis: Set(input.synopsis.clone()),
            score: Set(input.score),
            status: Set(input.status.as_str().to_string()),
            user_rating: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
            ..Default::default()
        };

        Favorites::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::columns([
                    favorites::Column::UserId,
                    favorites::Column::MalId,
                ])
                .update_columns([
                    favorites::Column::Title,
                    favorites::Column::Image,
                    favorites::Column::Url,
                    favorites::Column::Synopsis,
                    favorites::Column::Score,
                    favorites::Column::Status,
                    favorites::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&self.conn)
            .await
            .context("Failed to upsert favorite")?;

        let stored = Favorites::find()
            .filter(favorites::Column::UserId.eq(user_id))
            .filter(favorites::Column::MalId.eq(input.mal_id.value()))
            .one(&self.conn)
            .await
            .context("Failed to reload favorite")?
            .ok_or_else(|| anyhow::anyhow!("Favorite vanished after upsert"))?;

        Ok(Self::map_model(stored))
    }

    /// Newest first; ties on `created_at` fall back to the id.
    pub async fn list(&self, user_id: i32, status: Option<WatchStatus>) -> Result<Vec<Favorite>> {
        let mut query = Favorites::find().filter(favorites::Column::UserId.eq(user_id));

        if let Some(status) = status {
            query = query.filter(favorites::Column::Status.eq(status.as_str()));
        }

        let rows = query
            .order_by_desc(favorites::Column::CreatedAt)
            .order_by_desc(favorites::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list favorites")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get(&self, user_id: i32, id: i32) -> Result<Option<Favorite>> {
        Ok(self.find_owned(user_id, id).await?.map(Self::map_model))
    }

    pub async fn update(
        &self,
        user_id: i32,
        id: i32,
        patch: &FavoritePatch,
    ) -> Result<Option<Favorite>> {
        let Some(model) = self.find_owned(user_id, id).await? else {
            return Ok(None);
        };

        let mut active: favorites::ActiveModel = model.into();
        if let Some(status) = patch.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(rating) = patch.user_rating {
            active.user_rating = Set(rating);
        }
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());

        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update favorite")?;

        Ok(Some(Self::map_model(updated)))
    }

    pub async fn remove(&self, user_id: i32, id: i32) -> Result<bool> {
        let result = Favorites::delete_many()
            .filter(favorites::Column::Id.eq(id))
            .filter(favorites::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete favorite")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn status_counts(&self, user_id: i32) -> Result<StatusCounts> {
        let rows: Vec<(String, i64)> = Favorites::find()
            .select_only()
            .column(favorites::Column::Status)
            .column_as(favorites::Column::Id.count(), "count")
            .filter(favorites::Column::UserId.eq(user_id))
            .group_by(favorites::Column::Status)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to count favorites by status")?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            let status = status.parse().unwrap_or_default();
            counts.add(status, u64::try_from(count).unwrap_or(0));
        }

        Ok(counts)
    }

    pub async fn statuses(&self, user_id: i32) -> Result<Vec<(i32, WatchStatus)>> {
        let rows: Vec<(i32, String)> = Favorites::find()
            .select_only()
            .column(favorites::Column::MalId)
            .column(favorites::Column::Status)
            .filter(favorites::Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to load favorite statuses")?;

        Ok(rows
            .into_iter()
            .map(|(mal_id, status)| (mal_id, status.parse().unwrap_or_default()))
            .collect())
    }
}
