use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, SqlErr, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::{GeneralConfig, SecurityConfig};
use crate::domain::{FavoriteId, WatchStatus};
use crate::models::favorite::{Favorite, FavoriteInput, FavoritePatch, StatusCounts};

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

/// True when `err` wraps a unique-constraint violation from the database.
#[must_use]
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .is_some_and(|e| matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))))
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    /// Opens the database named in `[general]` with its pool settings.
    pub async fn from_config(general: &GeneralConfig) -> Result<Self> {
        Self::with_pool_options(
            &general.database_path,
            general.max_db_connections,
            general.min_db_connections,
        )
        .await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:").trim_start_matches("//");
        let in_memory = path_str.starts_with(":memory:");
        if !in_memory {
            let path = Path::new(path_str.split('?').next().unwrap_or(path_str));
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !path.exists() {
                std::fs::File::create(path)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        // Every in-memory connection is its own database, so keep exactly one alive.
        if in_memory {
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(max_connections)
                .min_connections(min_connections)
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn favorite_repo(&self) -> repositories::favorite::FavoriteRepository {
        repositories::favorite::FavoriteRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo().create(username, password, config).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn update_user_password(
        &self,
        username: &str,
        new_password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(username, new_password, config)
            .await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }

    pub async fn get_user_api_key(&self, username: &str) -> Result<Option<String>> {
        self.user_repo().get_api_key(username).await
    }

    pub async fn regenerate_user_api_key(&self, username: &str) -> Result<String> {
        self.user_repo().regenerate_api_key(username).await
    }

    // Favorites

    pub async fn upsert_favorite(&self, user_id: i32, input: &FavoriteInput) -> Result<Favorite> {
        self.favorite_repo().upsert(user_id, input).await
    }

    pub async fn list_favorites(
        &self,
        user_id: i32,
        status: Option<WatchStatus>,
    ) -> Result<Vec<Favorite>> {
        self.favorite_repo().list(user_id, status).await
    }

    pub async fn get_favorite(&self, user_id: i32, id: FavoriteId) -> Result<Option<Favorite>> {
        self.favorite_repo().get(user_id, id.value()).await
    }

    pub async fn update_favorite(
        &self,
        user_id: i32,
        id: FavoriteId,
        patch: &FavoritePatch,
    ) -> Result<Option<Favorite>> {
        self.favorite_repo().update(user_id, id.value(), patch).await
    }

    pub async fn remove_favorite(&self, user_id: i32, id: FavoriteId) -> Result<bool> {
        self.favorite_repo().remove(user_id, id.value()).await
    }

    pub async fn favorite_status_counts(&self, user_id: i32) -> Result<StatusCounts> {
        self.favorite_repo().status_counts(user_id).await
    }

    pub async fn favorite_statuses(&self, user_id: i32) -> Result<Vec<(i32, WatchStatus)>> {
        self.favorite_repo().statuses(user_id).await
    }
}
