use chrono::{DateTime, SubsecRound, Utc};
use std::sync::Arc;

use crate::{
    cache::WeatherCache,
    error::Result,
    model::{Coordinate, NewObservation, WeatherObservation},
    provider::ForecastProvider,
};

/// Cache-aside lookup of current weather for a coordinate.
///
/// A hit returns the stored row without touching the forecast provider. A miss
/// fetches once, appends the result as a new row and returns that row. Errors
/// from either side are returned as-is; there is no retry and no fallback to
/// stale rows. Concurrent misses for one coordinate are not coalesced.
#[derive(Debug, Clone)]
pub struct WeatherService {
    cache: WeatherCache,
    forecast: Arc<dyn ForecastProvider>,
}

impl WeatherService {
    pub fn new(cache: WeatherCache, forecast: Arc<dyn ForecastProvider>) -> Self {
        Self { cache, forecast }
    }

    pub async fn get_weather(&self, coordinate: Coordinate) -> Result<WeatherObservation> {
        self.get_weather_at(coordinate, Utc::now()).await
    }

    /// Lookup as of `now`. Sub-microsecond precision is dropped before stamping.
    pub async fn get_weather_at(
        &self,
        coordinate: Coordinate,
        now: DateTime<Utc>,
    ) -> Result<WeatherObservation> {
        // SQLite keeps microsecond precision.
        let now = now.trunc_subsecs(6);

        if let Some(cached) = self.cache.find_fresh(coordinate, now).await? {
            tracing::info!(
                latitude = coordinate.latitude(),
                longitude = coordinate.longitude(),
                id = %cached.id,
                "found cached weather data"
            );
            return Ok(cached);
        }

        let conditions = self.forecast.fetch(coordinate).await?;
        let stored = self
            .cache
            .insert(NewObservation::new(coordinate, conditions, now))
            .await?;

        tracing::info!(
            latitude = coordinate.latitude(),
            longitude = coordinate.longitude(),
            id = %stored.id,
            "fetched fresh weather data"
        );
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::WeatherError,
        store::{MemoryObservationStore, SqliteObservationStore},
        testing::{FailingStore, FakeForecast, conditions, london},
    };
    use chrono::{TimeDelta, TimeZone};

    struct Harness {
        store: Arc<MemoryObservationStore>,
        forecast: Arc<FakeForecast>,
        service: WeatherService,
    }

    fn harness(forecast: FakeForecast) -> Harness {
        let store = Arc::new(MemoryObservationStore::new());
        let forecast = Arc::new(forecast);
        let cache = WeatherCache::new(store.clone(), TimeDelta::hours(1));
        let service = WeatherService::new(cache, forecast.clone());
        Harness { store, forecast, service }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn first_lookup_fetches_and_inserts_once() {
        let h = harness(FakeForecast::returning(conditions(20.5)));

        let obs = h.service.get_weather_at(london(), t0()).await.unwrap();

        assert_eq!(h.forecast.calls(), 1);
        assert_eq!(h.store.all(), vec![obs.clone()]);
        assert_eq!(obs.coordinate, london());
        assert_eq!(obs.temperature, 20.5);
        assert_eq!(obs.wind_bearing, 180.0);
        assert_eq!(obs.wind_speed, 5.5);
        assert_eq!(obs.sunrise, conditions(20.5).sunrise);
        assert_eq!(obs.captured_at, t0());
    }

    #[tokio::test]
    async fn repeat_within_window_is_served_from_store() {
        let h = harness(FakeForecast::returning(conditions(20.5)));

        let first = h.service.get_weather_at(london(), t0()).await.unwrap();
        let second = h
            .service
            .get_weather_at(london(), t0() + TimeDelta::minutes(10))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(h.forecast.calls(), 1);
        assert_eq!(h.store.all().len(), 1);
    }

    #[tokio::test]
    async fn lookup_after_window_fetches_again_and_keeps_old_row() {
        let h = harness(FakeForecast::returning(conditions(25.0)).then(Ok(conditions(20.5))));

        let first = h.service.get_weather_at(london(), t0()).await.unwrap();
        let later = t0() + TimeDelta::minutes(61);
        let second = h.service.get_weather_at(london(), later).await.unwrap();

        assert_eq!(h.forecast.calls(), 2);
        assert_ne!(first.id, second.id);
        assert_eq!(second.temperature, 25.0);
        assert_eq!(second.captured_at, later);
        assert_eq!(h.store.all(), vec![first, second]);
    }

    #[tokio::test]
    async fn fetch_failure_writes_nothing() {
        let h = harness(
            FakeForecast::returning(conditions(20.5))
                .then(Err(WeatherError::unavailable("forecast provider", "connection refused"))),
        );

        let err = h.service.get_weather_at(london(), t0()).await.unwrap_err();

        assert!(matches!(err, WeatherError::UpstreamUnavailable { .. }), "{err:?}");
        assert!(h.store.all().is_empty());
    }

    #[tokio::test]
    async fn malformed_response_propagates_unchanged() {
        let h = harness(
            FakeForecast::returning(conditions(20.5))
                .then(Err(WeatherError::malformed("forecast provider", "daily.sunrise is empty"))),
        );

        let err = h.service.get_weather_at(london(), t0()).await.unwrap_err();

        assert!(err.to_string().contains("daily.sunrise is empty"));
        assert!(h.store.all().is_empty());
    }

    #[tokio::test]
    async fn stale_row_is_not_used_as_fallback() {
        let h = harness(
            FakeForecast::returning(conditions(20.5))
                .then(Ok(conditions(18.0)))
                .then(Err(WeatherError::unavailable("forecast provider", "timeout"))),
        );

        h.service.get_weather_at(london(), t0()).await.unwrap();
        let err = h
            .service
            .get_weather_at(london(), t0() + TimeDelta::hours(2))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::UpstreamUnavailable { .. }));
        assert_eq!(h.store.all().len(), 1);
    }

    #[tokio::test]
    async fn works_against_sqlite() {
        let store = Arc::new(SqliteObservationStore::open_in_memory().unwrap());
        let forecast = Arc::new(FakeForecast::returning(conditions(20.5)));
        let service = WeatherService::new(
            WeatherCache::new(store.clone(), TimeDelta::hours(1)),
            forecast.clone(),
        );

        let first = service.get_weather_at(london(), t0()).await.unwrap();
        let again = service
            .get_weather_at(london(), t0() + TimeDelta::minutes(10))
            .await
            .unwrap();

        assert_eq!(first, again);
        assert_eq!(forecast.calls(), 1);
    }

    #[tokio::test]
    async fn sub_microsecond_timestamps_survive_a_cache_hit() {
        let store = Arc::new(SqliteObservationStore::open_in_memory().unwrap());
        let forecast = Arc::new(FakeForecast::returning(conditions(20.5)));
        let service = WeatherService::new(
            WeatherCache::new(store.clone(), TimeDelta::hours(1)),
            forecast.clone(),
        );
        let now = t0() + TimeDelta::nanoseconds(1_234_567);

        let first = service.get_weather_at(london(), now).await.unwrap();
        let again = service
            .get_weather_at(london(), now + TimeDelta::minutes(10))
            .await
            .unwrap();

        assert_eq!(first.captured_at, t0() + TimeDelta::microseconds(1_234));
        assert_eq!(first, again);
        assert_eq!(forecast.calls(), 1);
    }

    #[tokio::test]
    async fn store_read_failure_skips_the_provider() {
        let forecast = Arc::new(FakeForecast::returning(conditions(20.5)));
        let service = WeatherService::new(
            WeatherCache::new(Arc::new(FailingStore::on_read()), TimeDelta::hours(1)),
            forecast.clone(),
        );

        let err = service.get_weather_at(london(), t0()).await.unwrap_err();

        assert!(matches!(err, WeatherError::Store(_)), "{err:?}");
        assert_eq!(forecast.calls(), 0);
    }

    #[tokio::test]
    async fn store_write_failure_after_fetch_propagates() {
        let forecast = Arc::new(FakeForecast::returning(conditions(20.5)));
        let service = WeatherService::new(
            WeatherCache::new(Arc::new(FailingStore::on_write()), TimeDelta::hours(1)),
            forecast.clone(),
        );

        let err = service.get_weather_at(london(), t0()).await.unwrap_err();

        assert!(matches!(err, WeatherError::Store(_)), "{err:?}");
        assert!(err.to_string().contains("disk I/O error"));
        assert_eq!(forecast.calls(), 1);
    }
}
