//! Timezone compensation shared by the write path and the query path.
//!
//! The source reports wall-clock dates in a fixed zone while the store keeps
//! everything in UTC. Both stored measurements and query boundaries go through
//! [`TimeNormalizer`], so they are always compared in the same frame.

use chrono::{DateTime, Duration, NaiveTime, SubsecRound, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeNormalizer {
    offset: Duration,
}

impl TimeNormalizer {
    #[must_use]
    pub const fn new(offset: Duration) -> Self {
        Self { offset }
    }

    #[must_use]
    pub fn from_offset_minutes(minutes: i64) -> Self {
        Self::new(Duration::minutes(minutes))
    }

    #[must_use]
    pub const fn offset(&self) -> Duration {
        self.offset
    }

    /// Shift a source date by the fixed reporting offset.
    ///
    /// Precision is capped at microseconds, the resolution of the store, so a
    /// compensated date always equals its stored copy.
    #[must_use]
    pub fn compensate(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        (date + self.offset).trunc_subsecs(6)
    }

    /// 00:00:00.000 UTC of the calendar day containing `timestamp`.
    #[must_use]
    pub fn truncate_to_day(timestamp: DateTime<Utc>) -> DateTime<Utc> {
        timestamp.date_naive().and_time(NaiveTime::MIN).and_utc()
    }

    /// Compensate, then truncate. Used for every query boundary.
    #[must_use]
    pub fn day_start(&self, date: DateTime<Utc>) -> DateTime<Utc> {
        Self::truncate_to_day(self.compensate(date))
    }
}

impl Default for TimeNormalizer {
    fn default() -> Self {
        Self::new(Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn compensation_can_cross_midnight() {
        let normalizer = TimeNormalizer::from_offset_minutes(120);
        let late = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();

        assert_eq!(
            normalizer.compensate(late),
            Utc.with_ymd_and_hms(2024, 3, 11, 1, 59, 59).unwrap()
        );
        assert_eq!(
            normalizer.day_start(late),
            Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn truncate_drops_sub_second_precision() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 13, 4, 5).unwrap() + Duration::milliseconds(250);
        let day = TimeNormalizer::truncate_to_day(ts);

        assert_eq!(day, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(day.timestamp_subsec_millis(), 0);
    }

    #[test]
    fn compensation_drops_sub_microsecond_precision() {
        let normalizer = TimeNormalizer::from_offset_minutes(120);
        let ts = Utc.with_ymd_and_hms(2024, 3, 10, 22, 0, 0).unwrap() + Duration::nanoseconds(123_456_789);

        assert_eq!(
            normalizer.compensate(ts),
            Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap() + Duration::microseconds(123_456)
        );
    }

    #[test]
    fn negative_offsets_move_backwards() {
        let normalizer = TimeNormalizer::from_offset_minutes(-90);
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();

        assert_eq!(
            normalizer.day_start(ts),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
