//! Query Planner (§4.4): resolves each of the four analytic queries against the
//! store by probing the bucket set the Index Writer maintains.

use crate::error::QueryError;
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::instrument;
use tripindex_types::bbox::BoundingBox;
use tripindex_types::time::DateBucket;
use tripindex_types::window::Window;

/// All 32 single-character geohash prefixes, used when two query corners
/// disagree at the first character (§9, resolved open question #2).
const ALL_FIRST_CHAR_PREFIXES: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'j', 'k',
    'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StartStopFare {
    pub start_count: i64,
    pub stop_count: i64,
    pub fare_sum: f64,
}

pub struct Planner {
    store: Arc<dyn Store>,
}

impl Planner {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Q1: the number of trips currently open.
    #[instrument(skip(self))]
    pub async fn current_count(&self) -> Result<i64, QueryError> {
        let raw = self.store.get("current_trips_counter").await?;
        Ok(raw.and_then(|s| s.parse().ok()).unwrap_or(0))
    }

    /// Q2: the value of the counter at a past instant, via direct-hit then
    /// predecessor search within the same day bucket.
    #[instrument(skip(self))]
    pub async fn count_at_instant(&self, t: DateTime<Utc>) -> Result<i64, QueryError> {
        let ts = t.timestamp();

        if let Some(raw) = self.store.get(&format!("trips_counter:{ts}")).await? {
            return Ok(raw.parse().unwrap_or(0));
        }

        let date = DateBucket::for_instant(t);
        let event_times_key = format!("event_times:{date}");
        if !self.store.exists(&event_times_key).await? {
            return Ok(0);
        }

        let predecessor = self.store.predecessor(&event_times_key, ts).await?;
        let Some(predecessor_ts) = predecessor else {
            return Ok(0);
        };

        let raw = self
            .store
            .get(&format!("trips_counter:{predecessor_ts}"))
            .await?;
        Ok(raw.and_then(|s| s.parse().ok()).unwrap_or(0))
    }

    /// The target geohashes and time sub-keys shared by Q3 and Q4.
    async fn resolve_targets_and_sub_keys(
        &self,
        bbox: &BoundingBox,
        window: Window,
    ) -> Result<(Vec<String>, Vec<String>), QueryError> {
        let prefix = bbox.common_geohash_prefix()?;

        let targets = if prefix.is_empty() {
            let mut seen = std::collections::HashSet::new();
            for c in ALL_FIRST_CHAR_PREFIXES {
                let members = self
                    .store
                    .zrange(&format!("geohash_prefixes:{c}"), 0, -1)
                    .await?;
                seen.extend(members);
            }
            seen.into_iter().collect()
        } else {
            self.store
                .zrange(&format!("geohash_prefixes:{prefix}"), 0, -1)
                .await?
        };

        let sub_keys = window.sub_keys(Utc::now());
        Ok((targets, sub_keys))
    }

    /// Q3: count of trip-cell touches inside the bounding box over the window.
    /// A trip touching multiple cells is counted once per cell (§9, resolved
    /// open question #1 — this is "cell touches", not "distinct trips").
    #[instrument(skip(self))]
    pub async fn trips_passed_through(
        &self,
        bbox: &BoundingBox,
        window: Window,
    ) -> Result<i64, QueryError> {
        let (targets, sub_keys) = self.resolve_targets_and_sub_keys(bbox, window).await?;

        let mut total = 0i64;
        for g in &targets {
            for s in &sub_keys {
                total += self.store.zcard(&format!("geohash:{g}:{s}:tripids")).await? as i64;
            }
        }
        Ok(total)
    }

    /// Q4: start/stop/fare aggregates over the same target/sub-key resolution as Q3.
    #[instrument(skip(self))]
    pub async fn trips_start_stop(
        &self,
        bbox: &BoundingBox,
        window: Window,
    ) -> Result<StartStopFare, QueryError> {
        let (targets, sub_keys) = self.resolve_targets_and_sub_keys(bbox, window).await?;

        let mut result = StartStopFare::default();
        for g in &targets {
            for s in &sub_keys {
                if let Some(raw) = self
                    .store
                    .get(&format!("geohash:{g}:{s}:tot_start_counter"))
                    .await?
                {
                    result.start_count += raw.parse().unwrap_or(0);
                }
                if let Some(raw) = self
                    .store
                    .get(&format!("geohash:{g}:{s}:tot_stop_counter"))
                    .await?
                {
                    result.stop_count += raw.parse().unwrap_or(0);
                }
                if let Some(raw) = self
                    .store
                    .get(&format!("geohash:{g}:{s}:tot_fare_counter"))
                    .await?
                {
                    result.fare_sum += raw.parse().unwrap_or(0.0);
                }
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::writer::Writer;
    use chrono::TimeZone;
    use tripindex_types::event::{Event, EventKind};

    fn event(trip_id: i64, event: EventKind, lat: f64, lng: f64, fare: Option<f64>) -> Event {
        Event {
            trip_id,
            event,
            lat,
            lng,
            fare,
        }
    }

    /// The concrete end-to-end scenario: three trips, T1 < T2 < T3 < T4 < T5 on one day.
    async fn seeded_planner() -> (Planner, DateTime<Utc>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let writer = Writer::new(store.clone(), std::time::Duration::from_secs(90 * 86400));
        let t0 = Utc.with_ymd_and_hms(2026, 7, 28, 9, 0, 0).unwrap();

        writer
            .apply(
                &event(123, EventKind::Begin, 37.8025, -122.4058, None), // Coit Tower
                t0,
            )
            .await
            .unwrap();
        writer
            .apply(
                &event(456, EventKind::Begin, 37.80164, -122.402244, None), // Levi's
                t0 + chrono::Duration::seconds(1),
            )
            .await
            .unwrap();
        writer
            .apply(
                &event(
                    123,
                    EventKind::End,
                    37.800619,
                    -122.401782, // Piperade
                    Some(20.0),
                ),
                t0 + chrono::Duration::seconds(2),
            )
            .await
            .unwrap();
        writer
            .apply(
                &event(789, EventKind::Begin, 37.790789, -122.431812, None), // CPMC
                t0 + chrono::Duration::seconds(3),
            )
            .await
            .unwrap();
        writer
            .apply(
                &event(789, EventKind::End, 37.785057, -122.437992, Some(40.0)), // UCSF Mt Zion
                t0 + chrono::Duration::seconds(4),
            )
            .await
            .unwrap();

        (Planner::new(store), t0 + chrono::Duration::seconds(1))
    }

    #[tokio::test]
    async fn q1_current_count_reflects_one_open_trip() {
        let (planner, _) = seeded_planner().await;
        assert_eq!(planner.current_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn q2_count_at_instant_hits_the_t2_snapshot_directly() {
        let (planner, t2) = seeded_planner().await;
        assert_eq!(planner.count_at_instant(t2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn q3_and_q4_over_the_downtown_box() {
        let (planner, _) = seeded_planner().await;
        let bbox = BoundingBox::new(37.808374, -122.409196, 37.7952, -122.4028).unwrap();

        assert_eq!(
            planner
                .trips_passed_through(&bbox, Window::Days(0))
                .await
                .unwrap(),
            3
        );

        let agg = planner.trips_start_stop(&bbox, Window::Days(0)).await.unwrap();
        assert_eq!(agg.start_count, 2);
        assert_eq!(agg.stop_count, 1);
        assert_eq!(agg.fare_sum, 20.0);
    }

    #[tokio::test]
    async fn q3_and_q4_over_the_cpmc_box() {
        let (planner, _) = seeded_planner().await;
        let bbox = BoundingBox::new(37.791603, -122.439966, 37.785159, -122.43104).unwrap();

        assert_eq!(
            planner
                .trips_passed_through(&bbox, Window::Days(0))
                .await
                .unwrap(),
            2
        );

        let agg = planner.trips_start_stop(&bbox, Window::Days(0)).await.unwrap();
        assert_eq!(agg.start_count, 1);
        assert_eq!(agg.stop_count, 1);
        assert_eq!(agg.fare_sum, 40.0);
    }

    #[tokio::test]
    async fn q2_returns_zero_when_day_bucket_is_absent() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let planner = Planner::new(store);
        let t = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(planner.count_at_instant(t).await.unwrap(), 0);
    }
}
