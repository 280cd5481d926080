//! Index Writer (§4.3): applies a single validated event to the store, fanning
//! it out across the counter, trip-id, aggregate, and prefix key families.

use crate::error::WriterError;
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use tripindex_types::event::{Event, EventKind};
use tripindex_types::geohash::{Coordinate, GeoHash};
use tripindex_types::time::{DateBucket, WeekBucket};

pub struct Writer {
    store: Arc<dyn Store>,
    snapshot_retention: std::time::Duration,
}

impl Writer {
    /// `snapshot_retention` is the TTL applied to `trips_counter:*` snapshots and
    /// `event_times:*` buckets (`SNAPSHOT_RETENTION_DAYS`, default 90 days).
    pub fn new(store: Arc<dyn Store>, snapshot_retention: std::time::Duration) -> Self {
        Self {
            store,
            snapshot_retention,
        }
    }

    #[instrument(skip(self, event), fields(trip_id = event.trip_id))]
    /// Returns the geohash the event was written under, so a caller that
    /// tracks touched prefix keys (e.g. the optional sweep task) doesn't have
    /// to re-encode the coordinate.
    pub async fn apply(
        &self,
        event: &Event,
        arrival_time: DateTime<Utc>,
    ) -> Result<GeoHash, WriterError> {
        event.validate()?;

        let coord = Coordinate::new(event.lat, event.lng)
            .map_err(tripindex_types::event::MalformedEvent::from)?;
        let gh = GeoHash::encode(&coord).map_err(tripindex_types::event::MalformedEvent::from)?;
        let date = DateBucket::for_instant(arrival_time);
        let week = WeekBucket::for_instant(arrival_time);
        let ts = arrival_time.timestamp();

        let day_trips_key = format!("geohash:{gh}:days:{date}:tripids");
        let week_trips_key = format!("geohash:{gh}:weeks:{week}:tripids");
        let ttl = self.snapshot_retention;

        // Trip-id and prefix sets carry no explicit TTL in the base design.
        self.store
            .zadd(&day_trips_key, 0.0, &event.trip_id.to_string())
            .await?;
        self.store
            .zadd(&week_trips_key, 0.0, &event.trip_id.to_string())
            .await?;

        if matches!(event.event, EventKind::Begin | EventKind::End) {
            let delta = match event.event {
                EventKind::Begin => 1,
                EventKind::End => -1,
                EventKind::Update => unreachable!("filtered above"),
            };
            let snapshot_key = format!("trips_counter:{ts}");
            let next = self
                .store
                .transact_counter("current_trips_counter", &snapshot_key, ttl, delta)
                .await?;
            debug!(next, "published current_trips_counter");
            if next < 0 {
                warn!(
                    trip_id = event.trip_id,
                    next, "current_trips_counter went negative: stray end with no begin"
                );
            }

            let kind = match event.event {
                EventKind::Begin => "start",
                EventKind::End => "stop",
                EventKind::Update => unreachable!("filtered above"),
            };
            self.store
                .incr(&format!("geohash:{gh}:days:{date}:tot_{kind}_counter"))
                .await?;
            self.store
                .incr(&format!("geohash:{gh}:weeks:{week}:tot_{kind}_counter"))
                .await?;

            if let EventKind::End = event.event {
                let fare = event.fare.expect("validated: end requires fare");
                self.store
                    .incr_by_float(&format!("geohash:{gh}:days:{date}:tot_fare_counter"), fare)
                    .await?;
                self.store
                    .incr_by_float(
                        &format!("geohash:{gh}:weeks:{week}:tot_fare_counter"),
                        fare,
                    )
                    .await?;
            }

            let event_times_key = format!("event_times:{date}");
            self.store
                .zadd(&event_times_key, ts as f64, &ts.to_string())
                .await?;
            self.store.expire(&event_times_key, ttl).await?;
        }

        for prefix in gh.prefixes() {
            self.store
                .zadd(&format!("geohash_prefixes:{prefix}"), ts as f64, gh.as_str())
                .await?;
        }

        Ok(gh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use tripindex_types::event::EventKind;

    fn event(trip_id: i64, event: EventKind, lat: f64, lng: f64, fare: Option<f64>) -> Event {
        Event {
            trip_id,
            event,
            lat,
            lng,
            fare,
        }
    }

    #[tokio::test]
    async fn begin_then_end_returns_counter_to_zero() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let writer = Writer::new(store.clone(), std::time::Duration::from_secs(90 * 86400));
        let t = Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap();

        writer
            .apply(
                &event(123, EventKind::Begin, 37.8025, -122.4058, None),
                t,
            )
            .await
            .unwrap();
        assert_eq!(
            store.get("current_trips_counter").await.unwrap(),
            Some("1".to_string())
        );

        writer
            .apply(
                &event(123, EventKind::End, 37.800619, -122.401782, Some(20.0)),
                t + chrono::Duration::seconds(5),
            )
            .await
            .unwrap();
        assert_eq!(
            store.get("current_trips_counter").await.unwrap(),
            Some("0".to_string())
        );
    }

    #[tokio::test]
    async fn repeated_updates_in_same_cell_and_day_dedupe_to_singleton() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let writer = Writer::new(store.clone(), std::time::Duration::from_secs(90 * 86400));
        let t = Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap();

        for _ in 0..5 {
            writer
                .apply(
                    &event(1, EventKind::Update, 37.8025, -122.4058, None),
                    t,
                )
                .await
                .unwrap();
        }

        let gh = GeoHash::encode(&Coordinate::new(37.8025, -122.4058).unwrap()).unwrap();
        let date = DateBucket::for_instant(t);
        let key = format!("geohash:{gh}:days:{date}:tripids");
        assert_eq!(store.zcard(&key).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn end_without_fare_is_rejected_before_mutation() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let writer = Writer::new(store.clone(), std::time::Duration::from_secs(90 * 86400));
        let t = Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap();

        let err = writer
            .apply(&event(1, EventKind::End, 37.8025, -122.4058, None), t)
            .await;
        assert!(err.is_err());
        assert_eq!(store.get("current_trips_counter").await.unwrap(), None);
    }

    #[tokio::test]
    async fn every_prefix_of_the_geohash_gains_membership() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let writer = Writer::new(store.clone(), std::time::Duration::from_secs(90 * 86400));
        let t = Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap();

        writer
            .apply(
                &event(1, EventKind::Begin, 37.8025, -122.4058, None),
                t,
            )
            .await
            .unwrap();

        let gh = GeoHash::encode(&Coordinate::new(37.8025, -122.4058).unwrap()).unwrap();
        for prefix in gh.prefixes() {
            let members = store
                .zrange(&format!("geohash_prefixes:{prefix}"), 0, -1)
                .await
                .unwrap();
            assert!(members.contains(&gh.as_str().to_string()));
        }
    }
}
