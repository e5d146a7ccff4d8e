use crate::auth::repo::{PgUserStore, UserStore};
use crate::books::repo::{BookStore, PgBookStore};
use crate::config::AppConfig;
use crate::db;
use crate::memory::MemoryStore;
use std::sync::Arc;

/// Everything a handler needs, built once at startup and shared by clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub books: Arc<dyn BookStore>,
}

impl AppState {
    /// Connects to Postgres, runs migrations and wires the stores to the pool.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;

        Ok(Self {
            config,
            users: Arc::new(PgUserStore::new(pool.clone())),
            books: Arc::new(PgBookStore::new(pool)),
        })
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        books: Arc<dyn BookStore>,
    ) -> Self {
        Self {
            config,
            users,
            books,
        }
    }

    /// State backed by a fresh [`MemoryStore`] and the test configuration.
    pub fn in_memory() -> Self {
        Self::in_memory_with(AppConfig::for_tests())
    }

    pub fn in_memory_with(config: AppConfig) -> Self {
        let store = MemoryStore::new();
        Self {
            config: Arc::new(config),
            users: Arc::new(store.clone()),
            books: Arc::new(store),
        }
    }
}
