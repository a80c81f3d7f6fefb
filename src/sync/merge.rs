//! Builders turning fetched source data into ordered store operations.
//!
//! Full sync and the periodic update use separate builders:
//! [`sensor_merge_ops`] adds with set semantics and never touches stored
//! values, while [`latest_measurement_ops`] replaces the point at the latest
//! date so a revised reading overwrites the old one.

use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashSet};

use crate::source::{SourceMeasurement, SourceSensor, SourceStation};
use crate::store::Measurement;
use crate::sync::time::TimeNormalizer;

/// One write against the station store, applied in order by the batch executor.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Insert `{station_id, sensors: []}` unless the station already exists.
    EnsureStation { station_id: i32 },
    /// Append an empty sensor sub-document. Never recreates an existing key.
    CreateSensor { station_id: i32, key: String },
    /// Add values with set semantics: a date already stored is left as is.
    AddMeasurements {
        station_id: i32,
        key: String,
        values: Vec<Measurement>,
    },
    /// Remove any stored value at exactly `date`.
    PullMeasurement {
        station_id: i32,
        key: String,
        date: DateTime<Utc>,
    },
    /// Append one value.
    PushMeasurement {
        station_id: i32,
        key: String,
        measurement: Measurement,
    },
}

impl WriteOp {
    #[must_use]
    pub const fn station_id(&self) -> i32 {
        match self {
            Self::EnsureStation { station_id }
            | Self::CreateSensor { station_id, .. }
            | Self::AddMeasurements { station_id, .. }
            | Self::PullMeasurement { station_id, .. }
            | Self::PushMeasurement { station_id, .. } => *station_id,
        }
    }
}

impl Measurement {
    /// Normalize a source reading. Readings without a value are dropped.
    #[must_use]
    pub fn from_source(raw: &SourceMeasurement, normalizer: &TimeNormalizer) -> Option<Self> {
        raw.value.map(|value| Self {
            date: normalizer.compensate(raw.date),
            value,
        })
    }
}

/// One insert-if-absent per station. Re-running is a no-op once all exist.
#[must_use]
pub fn station_structure_ops(stations: &[SourceStation]) -> Vec<WriteOp> {
    stations
        .iter()
        .map(|station| WriteOp::EnsureStation {
            station_id: station.id,
        })
        .collect()
}

/// Full-sync operations for one station.
///
/// For every fetched sensor: a `CreateSensor` when the key is not persisted
/// yet, immediately followed by one `AddMeasurements` carrying all of its
/// normalized values. Sensors without values only get the creation.
#[must_use]
pub fn sensor_merge_ops(
    station_id: i32,
    fetched: &[SourceSensor],
    persisted_keys: &BTreeSet<String>,
    normalizer: &TimeNormalizer,
) -> Vec<WriteOp> {
    let mut known: HashSet<&str> = persisted_keys.iter().map(String::as_str).collect();
    let mut ops = Vec::with_capacity(fetched.len() * 2);

    for sensor in fetched {
        if known.insert(sensor.key.as_str()) {
            ops.push(WriteOp::CreateSensor {
                station_id,
                key: sensor.key.clone(),
            });
        }

        let values: Vec<Measurement> = sensor
            .values
            .iter()
            .filter_map(|raw| Measurement::from_source(raw, normalizer))
            .collect();

        if values.is_empty() {
            continue;
        }

        ops.push(WriteOp::AddMeasurements {
            station_id,
            key: sensor.key.clone(),
            values,
        });
    }

    ops
}

/// Periodic-update operations for one station.
///
/// Only the first (latest) reading of each sensor is used: the value stored
/// at that date is pulled, then the fresh one pushed. Every operation is bound
/// to `station_id`, the station being processed.
#[must_use]
pub fn latest_measurement_ops(
    station_id: i32,
    fetched: &[SourceSensor],
    normalizer: &TimeNormalizer,
) -> Vec<WriteOp> {
    let mut ops = Vec::with_capacity(fetched.len() * 2);

    for sensor in fetched {
        let Some(latest) = sensor.values.first() else {
            continue;
        };
        let Some(measurement) = Measurement::from_source(latest, normalizer) else {
            tracing::debug!(station_id, key = %sensor.key, "Latest reading has no value, skipping");
            continue;
        };

        ops.push(WriteOp::PullMeasurement {
            station_id,
            key: sensor.key.clone(),
            date: measurement.date,
        });
        ops.push(WriteOp::PushMeasurement {
            station_id,
            key: sensor.key.clone(),
            measurement,
        });
    }

    ops
}
