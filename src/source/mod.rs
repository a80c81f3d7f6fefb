//! External source of record for stations and their latest sensor readings.

pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::error::AppResult;

pub use client::HttpWeatherSource;
pub use models::{SourceMeasurement, SourceSensor, SourceStation};

/// Read-only access to the weather data source.
///
/// Implemented by [`HttpWeatherSource`] in production; tests script their own.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// All stations known to the source.
    async fn fetch_all_stations(&self) -> AppResult<Vec<SourceStation>>;

    /// The latest readings of every sensor of one station.
    ///
    /// During a full sync `values` may hold many historical points; for the
    /// periodic update only the first (latest) point is considered.
    async fn fetch_station_measurements(&self, station_id: i32) -> AppResult<Vec<SourceSensor>>;
}
