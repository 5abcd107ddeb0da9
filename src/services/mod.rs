pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthUser, LoginResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod favorite_service;
pub mod favorite_service_impl;
pub use favorite_service::{FavoriteError, FavoriteService};
pub use favorite_service_impl::SeaOrmFavoriteService;

pub mod catalog_service;
pub use catalog_service::{AnimeDetails, CatalogQuery, CatalogSearchResult, CatalogService};
