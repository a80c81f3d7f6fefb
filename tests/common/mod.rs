//! Shared fixtures: an in-memory store and a scripted weather source.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use weather_db::common::AppState;
use weather_db::config::{Config, Deployment};
use weather_db::error::{AppError, AppResult};
use weather_db::source::{SourceMeasurement, SourceSensor, SourceStation, WeatherSource};

/// Fresh in-memory SQLite database with the production schema.
pub async fn test_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("connect to in-memory sqlite");
    migration::Migrator::up(&db, None)
        .await
        .expect("run migrations");
    db
}

pub fn test_config(utc_offset_minutes: i64) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        source_base_url: "http://weather-source.invalid".to_string(),
        source_timeout_seconds: 5,
        source_utc_offset_minutes: utc_offset_minutes,
        sync_setup_on_start: false,
        sync_update_interval_seconds: 3600,
        sync_fetch_concurrency: 2,
        api_host: "127.0.0.1".to_string(),
        api_port: 0,
        api_concurrency_limit: 8,
        cache_ttl_seconds: 60,
        cache_max_bytes: 1024 * 1024,
        deployment: Deployment::Local,
    }
}

pub fn test_state(
    db: DatabaseConnection,
    source: Arc<ScriptedSource>,
    utc_offset_minutes: i64,
) -> AppState {
    AppState::new(db, test_config(utc_offset_minutes), source)
}

pub fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

pub fn reading(date: DateTime<Utc>, value: f64) -> SourceMeasurement {
    SourceMeasurement {
        date,
        value: Some(value),
    }
}

pub fn sensor(key: &str, values: Vec<SourceMeasurement>) -> SourceSensor {
    SourceSensor {
        key: key.to_string(),
        values,
    }
}

/// Source whose answers are set by the test. Unknown stations report no sensors.
#[derive(Default)]
pub struct ScriptedSource {
    stations: Mutex<Vec<SourceStation>>,
    readings: Mutex<BTreeMap<i32, Vec<SourceSensor>>>,
    failing: Mutex<BTreeSet<i32>>,
}

impl ScriptedSource {
    pub fn with_stations(ids: &[i32]) -> Arc<Self> {
        let source = Self::default();
        *source.stations.lock().unwrap() = ids.iter().map(|&id| SourceStation { id }).collect();
        Arc::new(source)
    }

    pub fn set_readings(&self, station_id: i32, sensors: Vec<SourceSensor>) {
        self.readings.lock().unwrap().insert(station_id, sensors);
    }

    pub fn fail_station(&self, station_id: i32) {
        self.failing.lock().unwrap().insert(station_id);
    }
}

#[async_trait]
impl WeatherSource for ScriptedSource {
    async fn fetch_all_stations(&self) -> AppResult<Vec<SourceStation>> {
        Ok(self.stations.lock().unwrap().clone())
    }

    async fn fetch_station_measurements(&self, station_id: i32) -> AppResult<Vec<SourceSensor>> {
        if self.failing.lock().unwrap().contains(&station_id) {
            return Err(AppError::Source(format!("station {station_id} unavailable")));
        }
        Ok(self
            .readings
            .lock()
            .unwrap()
            .get(&station_id)
            .cloned()
            .unwrap_or_default())
    }
}
