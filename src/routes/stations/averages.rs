use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::averages;
use crate::common::AppState;
use crate::error::{AppError, AppResult};
use crate::routes::cache;

use super::handlers::ensure_station;
use super::types::{DayAverageQuery, RangeAverageQuery};

fn midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Daily average per sensor
///
/// Sensors without measurements on that day are omitted.
#[utoipa::path(
    get,
    path = "/api/stations/{station_id}/averages/day",
    params(
        ("station_id" = i32, Path, description = "Station identifier"),
        DayAverageQuery
    ),
    responses(
        (status = 200, description = "Averages computed", body = Vec<averages::SensorAverage>),
        (status = 404, description = "Station not found"),
    ),
    tag = "averages"
)]
pub async fn get_day_average(
    State(state): State<AppState>,
    Path(station_id): Path<i32>,
    Query(query): Query<DayAverageQuery>,
) -> AppResult<Response> {
    let cache_key = cache::cache_key(
        "averages:day",
        &[&station_id.to_string(), &query.date.to_string()],
    );
    if let Some(cached) = cache::get_cached(&state, &cache_key).await {
        return cache::json_response((*cached).clone(), true);
    }

    ensure_station(&state, station_id).await?;

    let rows = averages::find_average_measurement_for_day(
        &state.db,
        &state.normalizer,
        station_id,
        midnight(query.date),
    )
    .await?;

    cache::cache_and_respond(&state, cache_key, &rows).await
}

/// Average per sensor over `[from, to)`
///
/// Sensors without measurements in the range are omitted.
#[utoipa::path(
    get,
    path = "/api/stations/{station_id}/averages/range",
    params(
        ("station_id" = i32, Path, description = "Station identifier"),
        RangeAverageQuery
    ),
    responses(
        (status = 200, description = "Averages computed", body = Vec<averages::SensorAverage>),
        (status = 400, description = "Invalid range"),
        (status = 404, description = "Station not found"),
    ),
    tag = "averages"
)]
pub async fn get_range_average(
    State(state): State<AppState>,
    Path(station_id): Path<i32>,
    Query(query): Query<RangeAverageQuery>,
) -> AppResult<Response> {
    if query.to <= query.from {
        return Err(AppError::BadRequest("to must be after from".to_string()));
    }

    let cache_key = cache::cache_key(
        "averages:range",
        &[
            &station_id.to_string(),
            &query.from.to_string(),
            &query.to.to_string(),
        ],
    );
    if let Some(cached) = cache::get_cached(&state, &cache_key).await {
        return cache::json_response((*cached).clone(), true);
    }

    ensure_station(&state, station_id).await?;

    let rows = averages::find_average_measurement_from_to(
        &state.db,
        &state.normalizer,
        station_id,
        midnight(query.from),
        midnight(query.to),
    )
    .await?;

    cache::cache_and_respond(&state, cache_key, &rows).await
}
