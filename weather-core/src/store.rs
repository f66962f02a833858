//! Append-only persistence for weather observations.
//!
//! Rows are never updated. A lookup asks for the most recent row with exactly
//! the given coordinate captured strictly after a cutoff.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{fmt::Debug, sync::Arc};

use crate::{
    Config,
    config::StoreBackend,
    error::Result,
    model::{Coordinate, NewObservation, ObservationId, WeatherObservation},
};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryObservationStore;
pub use sqlite::SqliteObservationStore;

#[async_trait]
pub trait ObservationStore: Send + Sync + Debug {
    /// Most recent observation for `coordinate` with `captured_at > cutoff`.
    async fn find_latest_since(
        &self,
        coordinate: Coordinate,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>>;

    /// Append a row. Duplicate coordinates are accepted.
    async fn insert(&self, observation: &NewObservation) -> Result<ObservationId>;

    /// Total number of stored rows.
    async fn count(&self) -> Result<u64>;
}

/// Open the store selected in config.
pub fn store_from_config(config: &Config) -> anyhow::Result<Arc<dyn ObservationStore>> {
    let store: Arc<dyn ObservationStore> = match config.store.backend {
        StoreBackend::Memory => Arc::new(MemoryObservationStore::new()),
        StoreBackend::Sqlite => {
            let path = config.store_path()?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            tracing::info!(path = %path.display(), "opening observation store");
            Arc::new(SqliteObservationStore::open(&path)?)
        }
    };
    Ok(store)
}
