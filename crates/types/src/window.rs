//! `Nd` / `Nw` trailing-window parsing and bucket-key expansion (§4.4, Q3/Q4).

use crate::error::WindowError;
use crate::time::{DateBucket, WeekBucket};
use chrono::{DateTime, Utc};
use std::str::FromStr;

/// A trailing time range: `Nd` (N days ending today) or `Nw` (N weeks ending this
/// ISO week). `0d`/`0w` denote the current period only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Days(u32),
    Weeks(u32),
}

impl Window {
    /// The `days:<date>` / `weeks:<WW>` sub-keys this window resolves to, anchored
    /// at `now`. Ordered most-recent-first; always has at least one element.
    pub fn sub_keys(&self, now: DateTime<Utc>) -> Vec<String> {
        match *self {
            Window::Days(0) => vec![format!("days:{}", DateBucket::for_instant(now))],
            Window::Days(n) => (0..n)
                .map(|i| format!("days:{}", DateBucket::days_before(now, i as i64)))
                .collect(),
            Window::Weeks(0) => vec![format!("weeks:{}", WeekBucket::for_instant(now))],
            Window::Weeks(n) => (0..n)
                .map(|i| format!("weeks:{}", WeekBucket::weeks_before(now, i as i64)))
                .collect(),
        }
    }
}

impl FromStr for Window {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(WindowError::Empty);
        }
        let (count, unit) = s.split_at(s.len() - 1);
        let n: u32 = count
            .parse()
            .map_err(|_| WindowError::InvalidCount(s.to_string()))?;
        match unit {
            "d" => Ok(Window::Days(n)),
            "w" => Ok(Window::Weeks(n)),
            _ => Err(WindowError::MissingUnit(s.to_string())),
        }
    }
}
