//! SQLite-backed observation store.
//!
//! One append-only `observations` table. rusqlite is blocking, so every call
//! runs on the blocking pool with the connection behind a mutex.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use std::{path::Path, sync::Arc};

use crate::{
    error::{Result, WeatherError},
    model::{Coordinate, NewObservation, ObservationId, WeatherObservation},
};

use super::ObservationStore;

const SUNRISE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone)]
pub struct SqliteObservationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteObservationStore {
    /// Open (or create) the database file and its schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                temperature REAL NOT NULL,
                wind_bearing REAL NOT NULL,
                wind_speed REAL NOT NULL,
                sunrise TEXT NOT NULL,
                captured_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_observations_lookup
                ON observations(latitude, longitude, captured_at DESC);
            "#,
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock())).await?
    }
}

/// Raw column values, converted outside the rusqlite row callback.
struct StoredRow {
    id: i64,
    latitude: f64,
    longitude: f64,
    temperature: f64,
    wind_bearing: f64,
    wind_speed: f64,
    sunrise: String,
    captured_at: i64,
}

impl StoredRow {
    fn from_sql(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            latitude: row.get(1)?,
            longitude: row.get(2)?,
            temperature: row.get(3)?,
            wind_bearing: row.get(4)?,
            wind_speed: row.get(5)?,
            sunrise: row.get(6)?,
            captured_at: row.get(7)?,
        })
    }

    fn into_observation(self) -> Result<WeatherObservation> {
        let coordinate = Coordinate::new(self.latitude, self.longitude)
            .map_err(|e| WeatherError::Store(format!("row {}: {e}", self.id)))?;
        let sunrise = NaiveDateTime::parse_from_str(&self.sunrise, SUNRISE_FORMAT)
            .map_err(|e| WeatherError::Store(format!("row {}: bad sunrise: {e}", self.id)))?;
        let captured_at = DateTime::from_timestamp_micros(self.captured_at)
            .ok_or_else(|| WeatherError::Store(format!("row {}: bad captured_at", self.id)))?;

        Ok(WeatherObservation {
            id: ObservationId(self.id),
            coordinate,
            temperature: self.temperature,
            wind_bearing: self.wind_bearing,
            wind_speed: self.wind_speed,
            sunrise,
            captured_at,
        })
    }
}

#[async_trait]
impl ObservationStore for SqliteObservationStore {
    async fn find_latest_since(
        &self,
        coordinate: Coordinate,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<WeatherObservation>> {
        let cutoff = cutoff.timestamp_micros();
        let row = self
            .blocking(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT id, latitude, longitude, temperature, wind_bearing, wind_speed,
                                sunrise, captured_at
                         FROM observations
                         WHERE latitude = ?1 AND longitude = ?2 AND captured_at > ?3
                         ORDER BY captured_at DESC, id DESC
                         LIMIT 1",
                        params![coordinate.latitude(), coordinate.longitude(), cutoff],
                        StoredRow::from_sql,
                    )
                    .optional()?;
                Ok(row)
            })
            .await?;

        row.map(StoredRow::into_observation).transpose()
    }

    async fn insert(&self, observation: &NewObservation) -> Result<ObservationId> {
        let obs = observation.clone();
        self.blocking(move |conn| {
            conn.execute(
                "INSERT INTO observations
                    (latitude, longitude, temperature, wind_bearing, wind_speed, sunrise,
                     captured_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    obs.coordinate.latitude(),
                    obs.coordinate.longitude(),
                    obs.conditions.temperature,
                    obs.conditions.wind_bearing,
                    obs.conditions.wind_speed,
                    obs.conditions.sunrise.format(SUNRISE_FORMAT).to_string(),
                    obs.captured_at.timestamp_micros(),
                ],
            )?;
            Ok(ObservationId(conn.last_insert_rowid()))
        })
        .await
    }

    async fn count(&self) -> Result<u64> {
        self.blocking(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }
}
