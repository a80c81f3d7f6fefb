use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Entry of `GET /stations`. Extra attributes are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStation {
    pub id: i32,
}

/// Entry of `GET /stations/{id}/measurements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSensor {
    pub key: String,
    #[serde(default)]
    pub values: Vec<SourceMeasurement>,
}

/// A raw reading. `value` is null when the station did not report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceMeasurement {
    #[serde(deserialize_with = "deserialize_source_date")]
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub value: Option<f64>,
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Parse a source date: RFC 3339, or a naive wall-clock time read in the UTC frame.
#[must_use]
pub fn parse_source_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_source_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_source_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date '{raw}'")))
}
