use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::common::AppState;
use crate::sync::worker;

/// Run the station sync task.
///
/// Performs the one-time setup (structure + full sync) on startup, then the
/// incremental update every interval. A failed run is logged and the next
/// tick tries again.
pub async fn run_station_sync(state: AppState) {
    let interval_secs = state.config.sync_update_interval_seconds.max(1);
    let setup_on_start = state.config.sync_setup_on_start;

    tracing::info!(interval_secs, setup_on_start, "Starting station sync scheduler");

    if setup_on_start {
        worker::setup_database(&state).await;
    }

    let period = Duration::from_secs(interval_secs);
    let mut ticker = interval_at(Instant::now() + period, period);
    // A slow run pushes the schedule back instead of bursting
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        tracing::debug!("Running station update...");
        worker::update_database(&state).await;
    }
}
