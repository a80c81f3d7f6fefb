use chrono::Utc;
use futures::stream::{self, Stream, StreamExt};
use sea_orm::{ConnectionTrait, TransactionTrait};
use std::collections::BTreeSet;

use crate::common::AppState;
use crate::error::AppResult;
use crate::source::{SourceSensor, WeatherSource};
use crate::store;
use crate::sync::batch::{execute_batch, BulkWriteResult};
use crate::sync::merge;
use crate::sync::time::TimeNormalizer;

/// Create a document for every station known to the source.
///
/// Existing stations are left untouched, so this is idempotent.
///
/// # Errors
///
/// Returns an error if the source fetch fails or the batch is rejected.
pub async fn construct_database_structure<C>(
    db: &C,
    source: &dyn WeatherSource,
) -> AppResult<BulkWriteResult>
where
    C: ConnectionTrait + TransactionTrait,
{
    let stations = source.fetch_all_stations().await?;
    tracing::info!(stations = stations.len(), "Constructing database structure");

    let ops = merge::station_structure_ops(&stations);
    let result = execute_batch(db, &ops, "database structure construction").await?;

    tracing::info!(
        created = result.stations_inserted,
        total = stations.len(),
        "Database structure ready"
    );
    Ok(result)
}

/// Full sync: merge every fetched measurement into every persisted station.
///
/// Sensors are created on first sight and values are added with set semantics,
/// so re-running never duplicates a stored date.
///
/// # Errors
///
/// Returns an error on the first failed station fetch (nothing is written) or
/// if the batch is rejected.
pub async fn fill_database_with_initial_values<C>(
    db: &C,
    source: &dyn WeatherSource,
    normalizer: &TimeNormalizer,
    concurrency: usize,
) -> AppResult<BulkWriteResult>
where
    C: ConnectionTrait + TransactionTrait,
{
    let persisted = store::load_station_sensor_keys(db).await?;
    let total = persisted.len();
    let no_keys = BTreeSet::new();

    let mut fetches = std::pin::pin!(fetch_in_order(
        source,
        persisted.keys().copied().collect(),
        concurrency,
    ));

    let mut ops = Vec::new();
    let mut current = 0;
    while let Some(fetched) = fetches.next().await {
        let (station_id, sensors) = fetched?;
        let keys = persisted.get(&station_id).unwrap_or(&no_keys);

        ops.extend(merge::sensor_merge_ops(station_id, &sensors, keys, normalizer));

        current += 1;
        tracing::info!(current, total, station_id, "Progress");
    }

    execute_batch(db, &ops, "filling the database with initial values").await
}

/// Periodic update: replace the latest measurement of every sensor of every
/// source station. Operations of all stations go into one batch.
///
/// # Errors
///
/// Returns an error on the first failed fetch or if the batch is rejected.
pub async fn fill_database_with_new_values<C>(
    db: &C,
    source: &dyn WeatherSource,
    normalizer: &TimeNormalizer,
    concurrency: usize,
) -> AppResult<BulkWriteResult>
where
    C: ConnectionTrait + TransactionTrait,
{
    let stations = source.fetch_all_stations().await?;
    let total = stations.len();

    let mut fetches = std::pin::pin!(fetch_in_order(
        source,
        stations.iter().map(|s| s.id).collect(),
        concurrency,
    ));

    let mut ops = Vec::new();
    let mut current = 0;
    while let Some(fetched) = fetches.next().await {
        let (station_id, sensors) = fetched?;

        ops.extend(merge::latest_measurement_ops(station_id, &sensors, normalizer));

        current += 1;
        tracing::info!(current, total, station_id, "Progress");
    }

    execute_batch(db, &ops, "filling the database with new values").await
}

/// Fetch measurements for `station_ids`, at most `concurrency` at a time,
/// yielding results in station order.
fn fetch_in_order(
    source: &dyn WeatherSource,
    station_ids: Vec<i32>,
    concurrency: usize,
) -> impl Stream<Item = AppResult<(i32, Vec<SourceSensor>)>> + '_ {
    stream::iter(station_ids)
        .map(move |station_id| async move {
            source
                .fetch_station_measurements(station_id)
                .await
                .map(|sensors| (station_id, sensors))
        })
        .buffered(concurrency.max(1))
}

/// Structure construction followed by the full sync.
///
/// Top-level boundary of the setup run: failures are logged, not returned.
pub async fn setup_database(state: &AppState) -> bool {
    tracing::info!(started_at = %Utc::now(), "Database setup started");

    let outcome = match construct_database_structure(&state.db, state.source.as_ref()).await {
        Ok(_) => {
            fill_database_with_initial_values(
                &state.db,
                state.source.as_ref(),
                &state.normalizer,
                state.config.sync_fetch_concurrency,
            )
            .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) => {
            state.response_cache.invalidate_all();
            tracing::info!(
                sensors_created = result.sensors_created,
                measurements_inserted = result.measurements_inserted,
                finished_at = %Utc::now(),
                "Database setup complete"
            );
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Database setup failed");
            false
        }
    }
}

/// Periodic update run. Failures are logged, not returned.
pub async fn update_database(state: &AppState) -> bool {
    tracing::info!(started_at = %Utc::now(), "Database update started");

    match fill_database_with_new_values(
        &state.db,
        state.source.as_ref(),
        &state.normalizer,
        state.config.sync_fetch_concurrency,
    )
    .await
    {
        Ok(result) => {
            state.response_cache.invalidate_all();
            tracing::info!(
                measurements_removed = result.measurements_removed,
                measurements_inserted = result.measurements_inserted,
                unmatched = result.unmatched,
                finished_at = %Utc::now(),
                "Database update complete"
            );
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Database update failed");
            false
        }
    }
}
