//! Core library for the weather lookup service.
//!
//! This crate defines:
//! - Configuration handling
//! - Open-Meteo forecast and geocoding clients
//! - An append-only observation store (SQLite or in-memory)
//! - The cache-aside lookup and the input-validating façade
//!
//! It is used by `weather-server`, but carries no transport concerns of its own.

pub mod cache;
pub mod config;
pub mod error;
pub mod facade;
pub mod model;
pub mod provider;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use cache::WeatherCache;
pub use config::Config;
pub use error::{ErrorKind, WeatherError};
pub use facade::WeatherFacade;
pub use model::{Coordinate, CurrentConditions, NewObservation, ObservationId, WeatherObservation};
pub use provider::{ForecastProvider, Geocoder};
pub use service::WeatherService;
pub use store::ObservationStore;
