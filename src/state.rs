use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::auth::services::ensure_admin;
use crate::config::AppConfig;
use crate::db::{postgres::PgRepository, Repository};
use crate::storage::{Storage, StorageClient};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repository>,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("run migrations")?;

        let storage = Arc::new(Storage::new(&config.storage).await?) as Arc<dyn StorageClient>;

        let state = Self::from_parts(Arc::new(PgRepository::new(pool)), config, storage);

        if let Some(admin) = &state.config.admin {
            ensure_admin(&state, admin)
                .await
                .context("bootstrap admin")?;
        }

        Ok(state)
    }

    pub fn from_parts(
        repo: Arc<dyn Repository>,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
    ) -> Self {
        Self {
            repo,
            config,
            storage,
        }
    }
}
