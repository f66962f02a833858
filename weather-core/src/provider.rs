use crate::{
    Config, Coordinate, CurrentConditions,
    error::{Result, WeatherError},
    provider::{forecast::OpenMeteoForecast, geocoding::OpenMeteoGeocoder},
};
use async_trait::async_trait;
use reqwest::{Client, Response};
use std::{fmt::Debug, sync::Arc};

pub mod forecast;
pub mod geocoding;

/// Reads current conditions for a coordinate from a forecast service.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(&self, coordinate: Coordinate) -> Result<CurrentConditions>;
}

/// Turns a place name into a coordinate. `Ok(None)` means no match.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn resolve(&self, place: &str) -> Result<Option<Coordinate>>;
}

/// Shared HTTP client for both providers, built from config.
pub fn http_client(config: &Config) -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(config.providers.timeout())
        .user_agent(concat!("weather-server/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Construct both providers from config, sharing one connection pool.
pub fn providers_from_config(
    config: &Config,
) -> anyhow::Result<(Arc<dyn ForecastProvider>, Arc<dyn Geocoder>)> {
    let http = http_client(config)?;

    let forecast = OpenMeteoForecast::new(http.clone(), config.providers.forecast_url.clone());
    let geocoder = OpenMeteoGeocoder::new(
        http,
        config.providers.geocoding_url.clone(),
        config.providers.language.clone(),
    );

    Ok((Arc::new(forecast), Arc::new(geocoder)))
}

/// Read the body of a provider response, turning transport trouble and
/// non-success statuses into `UpstreamUnavailable`.
pub(crate) async fn read_body(provider: &'static str, res: Response) -> Result<String> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| WeatherError::unavailable(provider, format!("failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(WeatherError::unavailable(
            provider,
            format!("status {}: {}", status, truncate_body(&body)),
        ));
    }

    Ok(body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
