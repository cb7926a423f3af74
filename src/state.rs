use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    auth::{
        jwt::JwtKeys,
        repo::{PgUserRepo, UserRepo},
    },
    config::{AppConfig, JwtConfig},
    memory::MemoryStore,
    titles::repo::{PgTitleRepo, TitleRepo},
};

#[derive(Clone)]
pub struct AppState {
    pub keys: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub titles: Arc<dyn TitleRepo>,
}

impl AppState {
    /// Connects to Postgres, applies migrations and wires the Postgres repositories.
    pub async fn init(config: &AppConfig) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        crate::auth::services::prime_decoy_hash();

        Ok(Self::from_parts(
            JwtKeys::from_config(&config.jwt),
            Arc::new(PgUserRepo::new(db.clone())),
            Arc::new(PgTitleRepo::new(db)),
        ))
    }

    pub fn from_parts(
        keys: JwtKeys,
        users: Arc<dyn UserRepo>,
        titles: Arc<dyn TitleRepo>,
    ) -> Self {
        Self {
            keys,
            users,
            titles,
        }
    }

    /// State over a fresh in-process store. Returns the store too so callers
    /// can seed or inspect it.
    pub fn in_memory(jwt: &JwtConfig) -> (Self, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let state = Self::from_parts(
            JwtKeys::from_config(jwt),
            store.clone() as Arc<dyn UserRepo>,
            store.clone() as Arc<dyn TitleRepo>,
        );
        (state, store)
    }
}
