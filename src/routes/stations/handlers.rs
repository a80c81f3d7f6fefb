use axum::{extract::State, Json};
use sea_orm::EntityTrait;

use crate::common::AppState;
use crate::entity::stations;
use crate::error::{AppError, AppResult};
use crate::store;

use super::types::StationSummary;

/// 404 unless the station has been synchronized.
pub(super) async fn ensure_station(state: &AppState, station_id: i32) -> AppResult<()> {
    stations::Entity::find_by_id(station_id)
        .one(&state.db)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::NotFound(format!("Station '{station_id}' not found")))
}

/// List stations with their sensor keys
#[utoipa::path(
    get,
    path = "/api/stations",
    responses(
        (status = 200, description = "Stations retrieved successfully", body = Vec<StationSummary>),
    ),
    tag = "stations"
)]
pub async fn list_stations(State(state): State<AppState>) -> AppResult<Json<Vec<StationSummary>>> {
    let keys = store::load_station_sensor_keys(&state.db).await?;

    Ok(Json(
        keys.into_iter()
            .map(|(station_id, sensors)| StationSummary {
                station_id,
                sensors: sensors.into_iter().collect(),
            })
            .collect(),
    ))
}
