use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{Result, WeatherError};

/// A validated latitude/longitude pair.
///
/// Used as the cache key with exact floating-point equality, so two values
/// that print the same but differ in the last bit are different keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherError::InvalidInput(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidInput(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }

        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Store-assigned identifier of a persisted observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObservationId(pub i64);

impl fmt::Display for ObservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The scalars read from the forecast provider for one coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Degrees, 0-360.
    pub wind_bearing: f64,
    pub wind_speed: f64,
    /// Provider-local time, no offset attached.
    pub sunrise: NaiveDateTime,
}

/// An observation that has been fetched but not yet written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    pub coordinate: Coordinate,
    pub conditions: CurrentConditions,
    pub captured_at: DateTime<Utc>,
}

impl NewObservation {
    pub fn new(
        coordinate: Coordinate,
        conditions: CurrentConditions,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            coordinate,
            conditions,
            captured_at,
        }
    }

    /// Attach the id the store handed back.
    pub fn stored_as(self, id: ObservationId) -> WeatherObservation {
        WeatherObservation {
            id,
            coordinate: self.coordinate,
            temperature: self.conditions.temperature,
            wind_bearing: self.conditions.wind_bearing,
            wind_speed: self.conditions.wind_speed,
            sunrise: self.conditions.sunrise,
            captured_at: self.captured_at,
        }
    }
}

/// A persisted, immutable weather reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherObservation {
    pub id: ObservationId,
    #[serde(flatten)]
    pub coordinate: Coordinate,
    pub temperature: f64,
    pub wind_bearing: f64,
    pub wind_speed: f64,
    pub sunrise: NaiveDateTime,
    pub captured_at: DateTime<Utc>,
}
