use std::sync::Arc;
use tokio::sync::RwLock;

use crate::clients::jikan::JikanClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, CatalogService, FavoriteService, SeaOrmAuthService, SeaOrmFavoriteService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub favorite_service: Arc<dyn FavoriteService>,

    pub catalog_service: Arc<CatalogService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::from_config(&config.general).await?;

        Self::with_store(config, store)
    }

    /// Wires services around an already opened store.
    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        // One pooled client for every catalog call.
        let jikan = Arc::new(JikanClient::from_config(&config.catalog)?);

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
            config.server.allow_registration,
        )) as Arc<dyn AuthService>;

        let favorite_service = Arc::new(SeaOrmFavoriteService::new(store.clone()))
            as Arc<dyn FavoriteService>;

        let catalog_service = Arc::new(CatalogService::new(jikan, config.catalog.clone()));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            auth_service,
            favorite_service,
            catalog_service,
        })
    }
}
