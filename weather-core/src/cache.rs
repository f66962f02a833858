use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;

use crate::{
    error::Result,
    model::{Coordinate, NewObservation, WeatherObservation},
    store::ObservationStore,
};

/// Read/write policy over the observation store.
///
/// An observation is fresh at `now` iff `captured_at > now - window`.
#[derive(Debug, Clone)]
pub struct WeatherCache {
    store: Arc<dyn ObservationStore>,
    window: TimeDelta,
}

impl WeatherCache {
    pub fn new(store: Arc<dyn ObservationStore>, window: TimeDelta) -> Self {
        Self { store, window }
    }

    pub async fn find_fresh(
        &self,
        coordinate: Coordinate,
        now: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>> {
        self.store.find_latest_since(coordinate, now - self.window).await
    }

    /// Append `observation` and hand it back with its store id.
    pub async fn insert(&self, observation: NewObservation) -> Result<WeatherObservation> {
        let id = self.store.insert(&observation).await?;
        Ok(observation.stored_as(id))
    }
}
