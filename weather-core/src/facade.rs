use std::sync::Arc;

use crate::{
    Config,
    cache::WeatherCache,
    error::{Result, WeatherError},
    model::{Coordinate, WeatherObservation},
    provider::{Geocoder, providers_from_config},
    service::WeatherService,
    store::store_from_config,
};

/// Entry points for front ends: validate raw input, resolve place names,
/// then delegate to [`WeatherService`].
#[derive(Debug, Clone)]
pub struct WeatherFacade {
    service: WeatherService,
    geocoder: Arc<dyn Geocoder>,
}

impl WeatherFacade {
    pub fn new(service: WeatherService, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { service, geocoder }
    }

    /// Wire providers, store and cache window from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let (forecast, geocoder) = providers_from_config(config)?;
        let store = store_from_config(config)?;
        let cache = WeatherCache::new(store, config.cache.freshness_window());
        Ok(Self::new(WeatherService::new(cache, forecast), geocoder))
    }

    pub async fn by_coordinate(&self, latitude: f64, longitude: f64) -> Result<WeatherObservation> {
        let coordinate = Coordinate::new(latitude, longitude).inspect_err(|_| {
            tracing::warn!(latitude, longitude, "invalid coordinates provided");
        })?;
        self.service.get_weather(coordinate).await
    }

    pub async fn by_place_name(&self, name: &str) -> Result<WeatherObservation> {
        let place = name.trim();
        if place.is_empty() {
            tracing::warn!("empty place name provided");
            return Err(WeatherError::InvalidInput("place name cannot be empty".to_string()));
        }

        let coordinate = self
            .geocoder
            .resolve(place)
            .await?
            .ok_or_else(|| WeatherError::NotFound(place.to_string()))?;

        self.service.get_weather(coordinate).await
    }
}
