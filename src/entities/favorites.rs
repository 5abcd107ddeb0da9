use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// MyAnimeList id of the catalog entry. Unique per user.
    pub mal_id: i32,

    pub title: String,

    pub image: Option<String>,

    pub url: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub synopsis: Option<String>,

    pub score: Option<f64>,

    /// Canonical `WatchStatus` string
    pub status: String,

    pub user_rating: Option<i32>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
