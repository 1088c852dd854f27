use std::sync::Arc;
use tracing::info;

use super::memory::MemoryStore;
use super::postgres::PgStore;
use super::store::DocumentStore;
use super::DatabaseError;
use crate::config::AppConfig;

/// Chooses and opens the document store named by `DATABASE_URL`.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
        if config.uses_memory_store() {
            info!("Using in-memory document store");
            return Ok(Arc::new(MemoryStore::new()));
        }
        let store = PgStore::connect(&config.database, config.filter.debug_logging).await?;
        Ok(Arc::new(store))
    }

    /// Connect and ensure tables exist.
    pub async fn connect_and_migrate(config: &AppConfig) -> Result<Arc<dyn DocumentStore>, DatabaseError> {
        let store = Self::connect(config).await?;
        store.migrate().await?;
        info!("Document store ready ({})", store.backend());
        Ok(store)
    }
}
