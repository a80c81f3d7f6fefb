use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StationSummary {
    pub station_id: i32,
    /// Sensor keys known for this station
    pub sensors: Vec<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DayAverageQuery {
    /// Calendar day (YYYY-MM-DD)
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RangeAverageQuery {
    /// First day included (YYYY-MM-DD)
    pub from: NaiveDate,
    /// First day excluded (YYYY-MM-DD)
    pub to: NaiveDate,
}
