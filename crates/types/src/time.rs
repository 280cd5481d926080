//! Day/week bucket formatting — the date/week suffixes embedded in store keys.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The `<date>` suffix in `geohash:<gh>:days:<date>:tripids` and `event_times:<date>`.
///
/// Formatted as `YYYY-M-D` with no zero-padding on month/day, matching the key
/// shape this system has always used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateBucket(String);

impl DateBucket {
    pub fn for_instant(t: DateTime<Utc>) -> Self {
        Self(format!("{}-{}-{}", t.year(), t.month(), t.day()))
    }

    pub fn days_before(t: DateTime<Utc>, n: i64) -> Self {
        Self::for_instant(t - Duration::days(n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DateBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The `<WW>` suffix in `geohash:<gh>:weeks:<WW>:tripids`, the ISO week number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WeekBucket(String);

impl WeekBucket {
    pub fn for_instant(t: DateTime<Utc>) -> Self {
        Self(format!("{:02}", t.iso_week().week()))
    }

    /// The ISO week `n * 7` days before `t` — the step Q3/Q4 use to walk
    /// backwards over a week-denominated window.
    pub fn weeks_before(t: DateTime<Utc>, n: i64) -> Self {
        Self::for_instant(t - Duration::days(n * 7))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WeekBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
