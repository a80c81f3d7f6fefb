//! Bulk submission of [`WriteOp`] lists.
//!
//! A batch runs inside one database transaction: operations are applied in
//! order and either all of them land or none do. There is no retry; a failed
//! batch is fatal for the run that built it.

use chrono::Utc;
use sea_orm::{
    sea_query::OnConflict, ActiveValue::NotSet, ColumnTrait, DatabaseTransaction, DbErr,
    EntityTrait, QueryFilter, Set, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entity::{measurements, sensors, stations};
use crate::error::{AppError, AppResult};
use crate::sync::merge::WriteOp;

/// Rows per insert statement
const BATCH_SIZE: usize = 1000;

/// Outcome of a bulk write as reported by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    pub ok: bool,
    pub stations_inserted: u64,
    pub sensors_created: u64,
    pub measurements_inserted: u64,
    pub measurements_removed: u64,
    /// Operations whose station or sensor does not exist (no-ops)
    pub unmatched: u64,
    /// First operation failure when `ok` is false
    pub error: Option<String>,
}

/// Apply `ops` in order inside a single transaction.
///
/// An operation failure rolls everything back and is reported through
/// `ok = false`. `Err` is reserved for failures of the transaction itself.
///
/// # Errors
///
/// Returns `DbErr` if the transaction cannot be opened, committed or rolled back.
pub async fn bulk_write<C>(db: &C, ops: &[WriteOp]) -> Result<BulkWriteResult, DbErr>
where
    C: TransactionTrait,
{
    let txn = db.begin().await?;
    let mut result = BulkWriteResult::default();
    let mut sensor_ids: HashMap<(i32, String), Uuid> = HashMap::new();

    for (index, op) in ops.iter().enumerate() {
        if let Err(e) = apply_op(&txn, op, &mut sensor_ids, &mut result).await {
            tracing::warn!(
                error = %e,
                index,
                station_id = op.station_id(),
                "Bulk write operation failed, rolling back batch"
            );
            txn.rollback().await?;
            return Ok(BulkWriteResult {
                ok: false,
                error: Some(format!("operation {index}: {e}")),
                ..BulkWriteResult::default()
            });
        }
    }

    txn.commit().await?;
    result.ok = true;
    Ok(result)
}

/// Submit a batch and validate the outcome.
///
/// `phase` names the run step for the error message. An empty batch is
/// trivially successful and never reaches the store.
///
/// # Errors
///
/// Returns `AppError::BatchWrite` if the store fails or reports the batch as not ok.
pub async fn execute_batch<C>(db: &C, ops: &[WriteOp], phase: &str) -> AppResult<BulkWriteResult>
where
    C: TransactionTrait,
{
    if ops.is_empty() {
        tracing::debug!(phase, "No operations to write");
        return Ok(BulkWriteResult {
            ok: true,
            ..BulkWriteResult::default()
        });
    }

    let result = bulk_write(db, ops)
        .await
        .map_err(|e| AppError::batch_write(phase, e.to_string()))?;

    if !result.ok {
        return Err(AppError::batch_write(
            phase,
            result
                .error
                .unwrap_or_else(|| "store reported the batch as not ok".to_string()),
        ));
    }

    tracing::debug!(
        phase,
        operations = ops.len(),
        stations_inserted = result.stations_inserted,
        sensors_created = result.sensors_created,
        measurements_inserted = result.measurements_inserted,
        measurements_removed = result.measurements_removed,
        unmatched = result.unmatched,
        "Bulk write applied"
    );

    Ok(result)
}

async fn apply_op(
    txn: &DatabaseTransaction,
    op: &WriteOp,
    sensor_ids: &mut HashMap<(i32, String), Uuid>,
    result: &mut BulkWriteResult,
) -> Result<(), DbErr> {
    match op {
        WriteOp::EnsureStation { station_id } => {
            let station = stations::ActiveModel {
                station_id: Set(*station_id),
                created_at: Set(Utc::now()),
            };

            result.stations_inserted += stations::Entity::insert(station)
                .on_conflict(
                    OnConflict::column(stations::Column::StationId)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(txn)
                .await?;
        }

        WriteOp::CreateSensor { station_id, key } => {
            if stations::Entity::find_by_id(*station_id)
                .one(txn)
                .await?
                .is_none()
            {
                result.unmatched += 1;
                return Ok(());
            }

            let sensor = sensors::ActiveModel {
                id: Set(Uuid::new_v4()),
                station_id: Set(*station_id),
                key: Set(key.clone()),
                created_at: Set(Utc::now()),
            };

            result.sensors_created += sensors::Entity::insert(sensor)
                .on_conflict(
                    OnConflict::columns([sensors::Column::StationId, sensors::Column::Key])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(txn)
                .await?;
        }

        WriteOp::AddMeasurements {
            station_id,
            key,
            values,
        } => {
            let Some(sensor_id) = resolve_sensor(txn, sensor_ids, *station_id, key).await? else {
                result.unmatched += 1;
                return Ok(());
            };

            for chunk in values.chunks(BATCH_SIZE) {
                let models = chunk.iter().map(|m| measurements::ActiveModel {
                    id: NotSet,
                    sensor_id: Set(sensor_id),
                    date: Set(m.date),
                    value: Set(m.value),
                });

                // Dates already stored for this sensor are skipped
                result.measurements_inserted += measurements::Entity::insert_many(models)
                    .on_conflict(
                        OnConflict::columns([
                            measurements::Column::SensorId,
                            measurements::Column::Date,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(txn)
                    .await?;
            }
        }

        WriteOp::PullMeasurement {
            station_id,
            key,
            date,
        } => {
            let Some(sensor_id) = resolve_sensor(txn, sensor_ids, *station_id, key).await? else {
                result.unmatched += 1;
                return Ok(());
            };

            result.measurements_removed += measurements::Entity::delete_many()
                .filter(measurements::Column::SensorId.eq(sensor_id))
                .filter(measurements::Column::Date.eq(*date))
                .exec(txn)
                .await?
                .rows_affected;
        }

        WriteOp::PushMeasurement {
            station_id,
            key,
            measurement,
        } => {
            let Some(sensor_id) = resolve_sensor(txn, sensor_ids, *station_id, key).await? else {
                result.unmatched += 1;
                return Ok(());
            };

            let model = measurements::ActiveModel {
                id: NotSet,
                sensor_id: Set(sensor_id),
                date: Set(measurement.date),
                value: Set(measurement.value),
            };

            result.measurements_inserted += measurements::Entity::insert(model)
                .exec_without_returning(txn)
                .await?;
        }
    }

    Ok(())
}

/// Look up the sensor row for `(station_id, key)`, memoized per batch.
async fn resolve_sensor(
    txn: &DatabaseTransaction,
    sensor_ids: &mut HashMap<(i32, String), Uuid>,
    station_id: i32,
    key: &str,
) -> Result<Option<Uuid>, DbErr> {
    let cache_key = (station_id, key.to_string());
    if let Some(id) = sensor_ids.get(&cache_key) {
        return Ok(Some(*id));
    }

    let found = sensors::Entity::find()
        .filter(sensors::Column::StationId.eq(station_id))
        .filter(sensors::Column::Key.eq(key))
        .one(txn)
        .await?;

    Ok(found.map(|sensor| {
        sensor_ids.insert(cache_key, sensor.id);
        sensor.id
    }))
}
