use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Result, WeatherError},
    model::{Coordinate, CurrentConditions},
    provider::read_body,
};

use super::ForecastProvider;

const PROVIDER: &str = "forecast provider";

/// Open-Meteo `/v1/forecast` client reading current weather plus today's sunrise.
#[derive(Debug, Clone)]
pub struct OpenMeteoForecast {
    http: Client,
    base_url: String,
}

impl OpenMeteoForecast {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn request(&self, coordinate: Coordinate) -> Result<CurrentConditions> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("latitude", coordinate.latitude().to_string()),
                ("longitude", coordinate.longitude().to_string()),
                ("current_weather", "true".to_string()),
                ("daily", "sunrise".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::unavailable(PROVIDER, e))?;

        let body = read_body(PROVIDER, res).await?;
        parse_forecast(&body)
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrentWeather {
    temperature: f64,
    winddirection: f64,
    windspeed: f64,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    sunrise: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current_weather: OmCurrentWeather,
    daily: OmDaily,
}

fn parse_forecast(body: &str) -> Result<CurrentConditions> {
    let parsed: OmForecastResponse =
        serde_json::from_str(body).map_err(|e| WeatherError::malformed(PROVIDER, e))?;

    let first = parsed
        .daily
        .sunrise
        .first()
        .ok_or_else(|| WeatherError::malformed(PROVIDER, "daily.sunrise is empty"))?;

    Ok(CurrentConditions {
        temperature: parsed.current_weather.temperature,
        wind_bearing: parsed.current_weather.winddirection,
        wind_speed: parsed.current_weather.windspeed,
        sunrise: parse_local_time(first)?,
    })
}

/// Open-Meteo sends local times like `2024-06-01T04:43`, sometimes with seconds.
fn parse_local_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| WeatherError::malformed(PROVIDER, format!("unparsable sunrise '{value}'")))
}

#[async_trait]
impl ForecastProvider for OpenMeteoForecast {
    async fn fetch(&self, coordinate: Coordinate) -> Result<CurrentConditions> {
        let result = self.request(coordinate).await;

        if let Err(err) = &result {
            tracing::error!(
                latitude = coordinate.latitude(),
                longitude = coordinate.longitude(),
                error = %err,
                "forecast request failed"
            );
        }

        result
    }
}
