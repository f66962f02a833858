use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherError},
    model::Coordinate,
    provider::read_body,
};

use super::Geocoder;

const PROVIDER: &str = "geocoding provider";

/// Open-Meteo `/v1/search` client. Asks for a single best match.
#[derive(Debug, Clone)]
pub struct OpenMeteoGeocoder {
    http: Client,
    base_url: String,
    language: String,
}

impl OpenMeteoGeocoder {
    pub fn new(http: Client, base_url: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            language: language.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    name: Option<String>,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct GeoSearchResponse {
    // Omitted entirely when nothing matches.
    #[serde(default)]
    results: Vec<GeoResult>,
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn resolve(&self, place: &str) -> Result<Option<Coordinate>> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("name", place),
                ("count", "1"),
                ("language", self.language.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(place, error = %e, "geocoding request failed");
                WeatherError::unavailable(PROVIDER, e)
            })?;

        let body = read_body(PROVIDER, res).await.inspect_err(|e| {
            tracing::error!(place, error = %e, "geocoding request failed");
        })?;

        let parsed: GeoSearchResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!(place, error = %e, "geocoding response could not be parsed");
            WeatherError::malformed(PROVIDER, e)
        })?;

        let Some(first) = parsed.results.first() else {
            tracing::warn!(place, "no geocoding match");
            return Ok(None);
        };

        let coordinate = Coordinate::new(first.latitude, first.longitude).map_err(|e| {
            tracing::error!(place, error = %e, "geocoding match is out of range");
            WeatherError::malformed(PROVIDER, e)
        })?;

        tracing::info!(
            place,
            matched = first.name.as_deref().unwrap_or_default(),
            latitude = coordinate.latitude(),
            longitude = coordinate.longitude(),
            "resolved place"
        );
        Ok(Some(coordinate))
    }
}
