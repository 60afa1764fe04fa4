use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A closed interval of time, both the start and end instants are inside.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates the range, swapping the ends if given in reverse order.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> TimeRange {
        if end < start {
            TimeRange { start: end, end: start }
        } else {
            TimeRange { start, end }
        }
    }

    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> TimeRange {
        TimeRange::new(start, start + duration)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        t >= self.start && t <= self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.start.format("%Y-%m-%dT%H:%M:%S%.6fZ"),
            self.end.format("%Y-%m-%dT%H:%M:%S%.6fZ")
        )
    }
}

/// Offset from the first sample to the i-th, at nanosecond resolution.
pub(crate) fn sample_offset(i: i64, sample_rate: f64) -> Duration {
    Duration::nanoseconds((i as f64 * 1.0e9 / sample_rate).round() as i64)
}

/// Length of a duration in fractional seconds.
pub(crate) fn as_seconds(d: Duration) -> f64 {
    match d.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1.0e9,
        // beyond ~292 years nanoseconds overflow
        None => d.num_milliseconds() as f64 / 1.0e3,
    }
}
