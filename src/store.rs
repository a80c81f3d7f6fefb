//! Document view over the station tables.
//!
//! The store is relational, but callers reason about one document per station:
//! `{stationId, sensors: [{key, values: [{date, value}]}]}`.

use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{measurements, sensors, stations};
use crate::error::AppResult;

/// A measurement in the store's UTC frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Measurement {
    pub date: DateTime<Utc>,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SensorDocument {
    pub key: String,
    /// Values in insertion order
    pub values: Vec<Measurement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StationDocument {
    pub station_id: i32,
    /// Never absent; empty until the first reading arrives
    pub sensors: Vec<SensorDocument>,
}

/// Sensor keys per persisted station. Stations without sensors map to an empty set.
pub async fn load_station_sensor_keys<C>(db: &C) -> AppResult<BTreeMap<i32, BTreeSet<String>>>
where
    C: ConnectionTrait,
{
    let mut keys: BTreeMap<i32, BTreeSet<String>> = stations::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|s| (s.station_id, BTreeSet::new()))
        .collect();

    for sensor in sensors::Entity::find().all(db).await? {
        keys.entry(sensor.station_id).or_default().insert(sensor.key);
    }

    Ok(keys)
}

/// Load one station document, or `None` if the station was never created.
pub async fn load_station_document<C>(db: &C, station_id: i32) -> AppResult<Option<StationDocument>>
where
    C: ConnectionTrait,
{
    let Some(station) = stations::Entity::find_by_id(station_id).one(db).await? else {
        return Ok(None);
    };

    Ok(assemble_documents(db, vec![station]).await?.pop())
}

/// Load every station document ordered by station id.
pub async fn load_station_documents<C>(db: &C) -> AppResult<Vec<StationDocument>>
where
    C: ConnectionTrait,
{
    let stations_list = stations::Entity::find()
        .order_by_asc(stations::Column::StationId)
        .all(db)
        .await?;

    assemble_documents(db, stations_list).await
}

async fn assemble_documents<C>(
    db: &C,
    stations_list: Vec<stations::Model>,
) -> AppResult<Vec<StationDocument>>
where
    C: ConnectionTrait,
{
    let station_ids: Vec<i32> = stations_list.iter().map(|s| s.station_id).collect();

    let sensors_list = sensors::Entity::find()
        .filter(sensors::Column::StationId.is_in(station_ids))
        .order_by_asc(sensors::Column::CreatedAt)
        .order_by_asc(sensors::Column::Key)
        .all(db)
        .await?;

    let sensor_ids: Vec<Uuid> = sensors_list.iter().map(|s| s.id).collect();

    let mut values_by_sensor: HashMap<Uuid, Vec<Measurement>> = HashMap::new();
    if !sensor_ids.is_empty() {
        let rows = measurements::Entity::find()
            .filter(measurements::Column::SensorId.is_in(sensor_ids))
            .order_by_asc(measurements::Column::Id)
            .all(db)
            .await?;

        for row in rows {
            values_by_sensor
                .entry(row.sensor_id)
                .or_default()
                .push(Measurement {
                    date: row.date,
                    value: row.value,
                });
        }
    }

    let mut sensors_by_station: HashMap<i32, Vec<SensorDocument>> = HashMap::new();
    for sensor in sensors_list {
        let values = values_by_sensor.remove(&sensor.id).unwrap_or_default();
        sensors_by_station
            .entry(sensor.station_id)
            .or_default()
            .push(SensorDocument {
                key: sensor.key,
                values,
            });
    }

    Ok(stations_list
        .into_iter()
        .map(|station| StationDocument {
            station_id: station.station_id,
            sensors: sensors_by_station
                .remove(&station.station_id)
                .unwrap_or_default(),
        })
        .collect())
}
