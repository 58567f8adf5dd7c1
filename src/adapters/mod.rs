//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod file_config_adapter;
#[cfg(feature = "postgres")]
pub mod postgres_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
#[cfg(feature = "web")]
pub mod web;

use std::sync::Arc;

use crate::domain::error::JournalError;
use crate::ports::config_port::ConfigPort;
use crate::ports::trade_store::TradeStore;

pub type SharedStore = Arc<dyn TradeStore + Send + Sync>;

/// Opens the store named by `[database] backend` (default `sqlite`).
pub fn open_store(config: &dyn ConfigPort) -> Result<SharedStore, JournalError> {
    let backend = config.get_string_or("database", "backend", "sqlite");
    tracing::debug!(%backend, "opening trade store");

    match backend.trim().to_lowercase().as_str() {
        #[cfg(feature = "sqlite")]
        "sqlite" => Ok(Arc::new(sqlite_adapter::SqliteAdapter::from_config(config)?)),
        #[cfg(feature = "postgres")]
        "postgres" | "postgresql" => Ok(Arc::new(postgres_adapter::PostgresAdapter::from_config(
            config,
        )?)),
        other => Err(JournalError::ConfigInvalid {
            section: "database".into(),
            key: "backend".into(),
            reason: format!("unsupported backend '{other}'"),
        }),
    }
}
