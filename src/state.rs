use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::{MemStore, PgStore, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await?;

        if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }

        let store = Arc::new(PgStore::new(pool)) as Arc<dyn Store>;
        Ok(Self { store, config })
    }

    /// In-memory state for tests: no database, no environment.
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: "postgres://localhost/unused".into(),
            session: crate::config::SessionConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
        });
        let store = Arc::new(MemStore::new()) as Arc<dyn Store>;
        Self { store, config }
    }
}
