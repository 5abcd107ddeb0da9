use crate::entities::favorites;
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

const UNIQUE_USER_MAL: &str = "idx_favorites_user_mal_id";
const BY_USER_CREATED: &str = "idx_favorites_user_created_at";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Backs the ON CONFLICT target used by the favorites upsert.
        manager
            .create_index(
                Index::create()
                    .name(UNIQUE_USER_MAL)
                    .table(Favorites)
                    .col(favorites::Column::UserId)
                    .col(favorites::Column::MalId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name(BY_USER_CREATED)
                    .table(Favorites)
                    .col(favorites::Column::UserId)
                    .col(favorites::Column::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name(BY_USER_CREATED).table(Favorites).to_owned())
            .await?;

        manager
            .drop_index(Index::drop().name(UNIQUE_USER_MAL).table(Favorites).to_owned())
            .await
    }
}
