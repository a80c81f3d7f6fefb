//! Read-only per-sensor averages over a day or a date range.
//!
//! Both boundaries go through [`TimeNormalizer::day_start`], the same
//! compensation applied to stored measurements, and the window is half-open:
//! `[start, end)`.

use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entity::{measurements, sensors};
use crate::error::AppResult;
use crate::sync::time::TimeNormalizer;

/// Time descriptor of an average row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AverageWindow {
    Day { date: DateTime<Utc> },
    Range { from: DateTime<Utc>, to: DateTime<Utc> },
}

/// One row per sensor key with at least one measurement in the window.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorAverage {
    /// Sensor key (the grouping key)
    #[serde(rename = "_id")]
    pub key: String,
    #[serde(rename = "stationId")]
    pub station_id: i32,
    #[serde(flatten)]
    pub window: AverageWindow,
    /// Arithmetic mean rounded to 2 decimals
    pub average: f64,
}

#[derive(Debug, FromQueryResult)]
struct SensorAverageRow {
    key: String,
    average: Option<f64>,
}

/// Average of every sensor of `station_id` over the calendar day of `day`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn find_average_measurement_for_day<C>(
    db: &C,
    normalizer: &TimeNormalizer,
    station_id: i32,
    day: DateTime<Utc>,
) -> AppResult<Vec<SensorAverage>>
where
    C: ConnectionTrait,
{
    let start = normalizer.day_start(day);
    let next_day = start + Duration::days(1);

    let window = AverageWindow::Day { date: start };
    Ok(average_by_sensor(db, station_id, start, next_day)
        .await?
        .into_iter()
        .map(|(key, average)| SensorAverage {
            key,
            station_id,
            window,
            average,
        })
        .collect())
}

/// Average of every sensor of `station_id` from the day of `from` up to, but
/// excluding, the day of `to`.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn find_average_measurement_from_to<C>(
    db: &C,
    normalizer: &TimeNormalizer,
    station_id: i32,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> AppResult<Vec<SensorAverage>>
where
    C: ConnectionTrait,
{
    let from = normalizer.day_start(from);
    let to = normalizer.day_start(to);

    let window = AverageWindow::Range { from, to };
    Ok(average_by_sensor(db, station_id, from, to)
        .await?
        .into_iter()
        .map(|(key, average)| SensorAverage {
            key,
            station_id,
            window,
            average,
        })
        .collect())
}

/// Round half away from zero to 2 decimal places.
#[must_use]
pub fn round_average(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `(key, rounded average)` for measurements in `[start, end)`, ordered by key.
async fn average_by_sensor<C>(
    db: &C,
    station_id: i32,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> AppResult<Vec<(String, f64)>>
where
    C: ConnectionTrait,
{
    let average = SimpleExpr::from(Func::avg(Expr::col((
        measurements::Entity,
        measurements::Column::Value,
    ))));

    let rows = measurements::Entity::find()
        .select_only()
        .column_as(sensors::Column::Key, "key")
        .column_as(average, "average")
        .inner_join(sensors::Entity)
        .filter(sensors::Column::StationId.eq(station_id))
        .filter(measurements::Column::Date.gte(start))
        .filter(measurements::Column::Date.lt(end))
        .group_by(sensors::Column::Key)
        .order_by_asc(sensors::Column::Key)
        .into_model::<SensorAverageRow>()
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| row.average.map(|avg| (row.key, round_average(avg))))
        .collect())
}
