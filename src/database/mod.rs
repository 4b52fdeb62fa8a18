pub mod manager;
pub mod memory;
pub mod models;
pub mod pagination;
pub mod postgres;
pub mod seed;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use pagination::{Page, PageQuery, PageRequest};
pub use postgres::PgStore;
pub use store::{CredentialStore, CustomerStore, EmployeeStore, GeoCount, ReportStore, Store, TicketStore, TypeCount};

use std::sync::Arc;
use tracing::info;

use crate::config::{DatabaseConfig, StoreBackend};

/// Open the configured backend. Postgres pools are migrated before use.
pub async fn open_store(config: &DatabaseConfig) -> Result<Arc<dyn Store>, DatabaseError> {
    match config.backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(config).await?;
            DatabaseManager::migrate(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
