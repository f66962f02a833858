//! Scripted provider fakes shared by unit tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::Mutex;
use std::{
    collections::VecDeque,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::{
    error::{Result, WeatherError},
    model::{Coordinate, CurrentConditions, NewObservation, ObservationId, WeatherObservation},
    provider::{ForecastProvider, Geocoder},
    store::ObservationStore,
};

pub fn london() -> Coordinate {
    Coordinate::new(51.5074, -0.1278).unwrap()
}

pub fn conditions(temperature: f64) -> CurrentConditions {
    CurrentConditions {
        temperature,
        wind_bearing: 180.0,
        wind_speed: 5.5,
        sunrise: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(4, 43, 0).unwrap(),
    }
}

/// Returns scripted results in order, then repeats the fallback.
#[derive(Debug)]
pub struct FakeForecast {
    script: Mutex<VecDeque<Result<CurrentConditions>>>,
    fallback: CurrentConditions,
    calls: AtomicUsize,
}

impl FakeForecast {
    pub fn returning(conditions: CurrentConditions) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: conditions,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn then(self, result: Result<CurrentConditions>) -> Self {
        self.script.lock().push_back(result);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ForecastProvider for FakeForecast {
    async fn fetch(&self, _coordinate: Coordinate) -> Result<CurrentConditions> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().pop_front() {
            Some(result) => result,
            None => Ok(self.fallback.clone()),
        }
    }
}

#[derive(Debug)]
pub enum GeocodeAnswer {
    Found(Coordinate),
    Missing,
    Down,
}

#[derive(Debug)]
pub struct FakeGeocoder {
    answer: GeocodeAnswer,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn new(answer: GeocodeAnswer) -> Self {
        Self {
            answer,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn resolve(&self, _place: &str) -> Result<Option<Coordinate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            GeocodeAnswer::Found(c) => Ok(Some(*c)),
            GeocodeAnswer::Missing => Ok(None),
            GeocodeAnswer::Down => {
                Err(WeatherError::unavailable("geocoding provider", "connection refused"))
            }
        }
    }
}

/// Store whose reads or writes always fail.
#[derive(Debug)]
pub struct FailingStore {
    fail_reads: bool,
}

impl FailingStore {
    pub fn on_read() -> Self {
        Self { fail_reads: true }
    }

    /// Reads report a miss; every insert fails.
    pub fn on_write() -> Self {
        Self { fail_reads: false }
    }
}

#[async_trait]
impl ObservationStore for FailingStore {
    async fn find_latest_since(
        &self,
        _coordinate: Coordinate,
        _cutoff: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>> {
        if self.fail_reads {
            return Err(WeatherError::Store("disk I/O error".into()));
        }
        Ok(None)
    }

    async fn insert(&self, _observation: &NewObservation) -> Result<ObservationId> {
        Err(WeatherError::Store("disk I/O error".into()))
    }

    async fn count(&self) -> Result<u64> {
        Ok(0)
    }
}
