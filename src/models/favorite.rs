use serde::{Deserialize, Serialize};

use crate::domain::{MalId, WatchStatus};

/// A favorite as handed to callers, without the owning user id.
#[derive(Debug, Clone, Serialize)]
pub struct Favorite {
    pub id: i32,
    pub mal_id: i32,
    pub title: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub synopsis: Option<String>,
    pub score: Option<f64>,
    pub status: WatchStatus,
    pub user_rating: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
}

/// Validated payload for the add-or-update operation.
#[derive(Debug, Clone)]
pub struct FavoriteInput {
    pub mal_id: MalId,
    pub title: String,
    pub image: Option<String>,
    pub url: Option<String>,
    pub synopsis: Option<String>,
    pub score: Option<f64>,
    pub status: WatchStatus,
}

/// Partial update. `user_rating: Some(None)` clears the rating.
#[derive(Debug, Clone, Default)]
pub struct FavoritePatch {
    pub status: Option<WatchStatus>,
    pub user_rating: Option<Option<i32>>,
}

impl FavoritePatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.user_rating.is_none()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub to_watch: u64,
    pub watching: u64,
    pub completed: u64,
    pub total: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: WatchStatus, count: u64) {
        match status {
            WatchStatus::ToWatch => self.to_watch += count,
            WatchStatus::Watching => self.watching += count,
            WatchStatus::Completed => self.completed += count,
        }
        self.total += count;
    }
}
