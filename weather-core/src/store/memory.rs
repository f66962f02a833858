use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::{
    error::Result,
    model::{Coordinate, NewObservation, ObservationId, WeatherObservation},
};

use super::ObservationStore;

/// Process-local store. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryObservationStore {
    rows: Mutex<Vec<WeatherObservation>>,
}

impl MemoryObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every row in insertion order.
    pub fn all(&self) -> Vec<WeatherObservation> {
        self.rows.lock().clone()
    }
}

#[async_trait]
impl ObservationStore for MemoryObservationStore {
    async fn find_latest_since(
        &self,
        coordinate: Coordinate,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>> {
        let rows = self.rows.lock();
        let latest = rows
            .iter()
            .filter(|row| row.coordinate == coordinate && row.captured_at > cutoff)
            .max_by_key(|row| (row.captured_at, row.id.0));
        Ok(latest.cloned())
    }

    async fn insert(&self, observation: &NewObservation) -> Result<ObservationId> {
        let mut rows = self.rows.lock();
        let id = ObservationId(rows.len() as i64 + 1);
        rows.push(observation.clone().stored_as(id));
        Ok(id)
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.rows.lock().len() as u64)
    }
}
