//! Integration tests for per-sensor averages.
//!
//! Run with: cargo test --test averages_test

mod common;

use common::{reading, sensor, test_db, utc, ScriptedSource};
use sea_orm::DatabaseConnection;
use weather_db::averages::{
    find_average_measurement_for_day, find_average_measurement_from_to, AverageWindow,
};
use weather_db::source::SourceSensor;
use weather_db::sync::time::TimeNormalizer;
use weather_db::sync::worker::{construct_database_structure, fill_database_with_initial_values};

async fn seeded(normalizer: &TimeNormalizer, readings: Vec<(i32, Vec<SourceSensor>)>) -> DatabaseConnection {
    let db = test_db().await;
    let ids: Vec<i32> = readings.iter().map(|(id, _)| *id).collect();
    let source = ScriptedSource::with_stations(&ids);
    for (id, sensors) in readings {
        source.set_readings(id, sensors);
    }

    construct_database_structure(&db, source.as_ref()).await.unwrap();
    fill_database_with_initial_values(&db, source.as_ref(), normalizer, 1)
        .await
        .unwrap();
    db
}

#[tokio::test]
async fn late_reading_lands_on_next_day_after_offset() {
    let normalizer = TimeNormalizer::from_offset_minutes(120);
    let db = seeded(
        &normalizer,
        vec![(114, vec![sensor("T", vec![reading(utc(2024, 3, 10, 23, 59, 59), 4.0)])])],
    )
    .await;

    let next_day = find_average_measurement_for_day(&db, &normalizer, 114, utc(2024, 3, 11, 0, 0, 0))
        .await
        .unwrap();
    assert_eq!(next_day.len(), 1);
    assert_eq!(next_day[0].key, "T");
    assert_eq!(next_day[0].average, 4.0);
    assert_eq!(
        next_day[0].window,
        AverageWindow::Day { date: utc(2024, 3, 11, 0, 0, 0) }
    );

    let same_day = find_average_measurement_for_day(&db, &normalizer, 114, utc(2024, 3, 10, 0, 0, 0))
        .await
        .unwrap();
    assert!(same_day.is_empty());
}

#[tokio::test]
async fn range_excludes_upper_bound() {
    let normalizer = TimeNormalizer::default();
    let db = seeded(
        &normalizer,
        vec![(
            1,
            vec![sensor(
                "PM10",
                vec![
                    reading(utc(2024, 1, 1, 6, 0, 0), 1.0),
                    reading(utc(2024, 1, 2, 18, 0, 0), 3.0),
                    reading(utc(2024, 1, 3, 0, 0, 0), 100.0),
                ],
            )],
        )],
    )
    .await;

    let rows = find_average_measurement_from_to(
        &db,
        &normalizer,
        1,
        utc(2024, 1, 1, 0, 0, 0),
        utc(2024, 1, 3, 0, 0, 0),
    )
    .await
    .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].average, 2.0);
    assert_eq!(
        rows[0].window,
        AverageWindow::Range {
            from: utc(2024, 1, 1, 0, 0, 0),
            to: utc(2024, 1, 3, 0, 0, 0),
        }
    );
}

#[tokio::test]
async fn sensors_without_data_in_window_are_omitted() {
    let normalizer = TimeNormalizer::default();
    let db = seeded(
        &normalizer,
        vec![
            (
                1,
                vec![
                    sensor("B", vec![reading(utc(2024, 2, 1, 8, 0, 0), 2.0)]),
                    sensor("A", vec![reading(utc(2024, 2, 2, 8, 0, 0), 6.0)]),
                    sensor("C", vec![]),
                ],
            ),
            (2, vec![]),
        ],
    )
    .await;

    let rows = find_average_measurement_for_day(&db, &normalizer, 1, utc(2024, 2, 2, 0, 0, 0))
        .await
        .unwrap();
    assert_eq!(rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(), vec!["A"]);

    let empty_station = find_average_measurement_for_day(&db, &normalizer, 2, utc(2024, 2, 2, 0, 0, 0))
        .await
        .unwrap();
    assert!(empty_station.is_empty());
}

#[tokio::test]
async fn rows_are_per_key_and_sorted() {
    let normalizer = TimeNormalizer::default();
    let db = seeded(
        &normalizer,
        vec![(
            1,
            vec![
                sensor(
                    "temp",
                    vec![
                        reading(utc(2024, 2, 1, 8, 0, 0), 10.0),
                        reading(utc(2024, 2, 1, 9, 0, 0), 20.0),
                    ],
                ),
                sensor("NO2", vec![reading(utc(2024, 2, 1, 8, 0, 0), 0.5)]),
            ],
        )],
    )
    .await;

    let rows = find_average_measurement_for_day(&db, &normalizer, 1, utc(2024, 2, 1, 0, 0, 0))
        .await
        .unwrap();

    assert_eq!(
        rows.iter().map(|r| (r.key.as_str(), r.average)).collect::<Vec<_>>(),
        vec![("NO2", 0.5), ("temp", 15.0)]
    );
    assert!(rows.iter().all(|r| r.station_id == 1));
}

#[tokio::test]
async fn averages_are_rounded_to_two_decimals() {
    let normalizer = TimeNormalizer::default();
    let db = seeded(
        &normalizer,
        vec![(
            1,
            vec![sensor(
                "T",
                vec![
                    reading(utc(2024, 2, 1, 8, 0, 0), 1.111),
                    reading(utc(2024, 2, 1, 9, 0, 0), 1.112),
                    reading(utc(2024, 2, 1, 10, 0, 0), 1.116),
                ],
            )],
        )],
    )
    .await;

    let rows = find_average_measurement_for_day(&db, &normalizer, 1, utc(2024, 2, 1, 0, 0, 0))
        .await
        .unwrap();

    assert_eq!(rows[0].average, 1.11);
}

#[tokio::test]
async fn other_stations_do_not_leak_into_averages() {
    let normalizer = TimeNormalizer::default();
    let day = utc(2024, 2, 1, 0, 0, 0);
    let db = seeded(
        &normalizer,
        vec![
            (1, vec![sensor("PM10", vec![reading(utc(2024, 2, 1, 8, 0, 0), 2.0)])]),
            (2, vec![sensor("PM10", vec![reading(utc(2024, 2, 1, 8, 0, 0), 40.0)])]),
        ],
    )
    .await;

    let rows = find_average_measurement_for_day(&db, &normalizer, 1, day).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].average, 2.0);
}
