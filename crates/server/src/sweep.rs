//! Optional background prefix-sweep task (§5), disabled by default.
//!
//! Geohash prefix sets (`geohash_prefixes:*`) grow without an eviction policy
//! in the base design. When enabled, this task periodically removes members
//! scored (last-seen epoch seconds) older than the retention window, for every
//! prefix key the writer has touched.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use tripindex::store::Store;
use tripindex_types::geohash::GeoHash;

/// Tracks which `geohash_prefixes:<prefix>` keys have been written, so the
/// sweep only visits keys known to exist.
#[derive(Default)]
pub struct TouchedPrefixes {
    keys: Mutex<HashSet<String>>,
}

impl TouchedPrefixes {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, gh: &GeoHash) {
        let mut keys = self.keys.lock().await;
        for prefix in gh.prefixes() {
            keys.insert(format!("geohash_prefixes:{prefix}"));
        }
    }

    async fn snapshot(&self) -> Vec<String> {
        self.keys.lock().await.iter().cloned().collect()
    }
}

/// Runs until the process exits. `interval` is `PREFIX_SWEEP_INTERVAL_SECONDS`;
/// the caller only spawns this when that value is nonzero.
pub async fn run(
    store: Arc<dyn Store>,
    touched: Arc<TouchedPrefixes>,
    interval: Duration,
    retention: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        let cutoff = (chrono::Utc::now() - chrono::Duration::from_std(retention).unwrap())
            .timestamp() as f64;
        let keys = touched.snapshot().await;
        debug!(count = keys.len(), "running prefix sweep");
        for key in keys {
            if let Err(e) = store.remove_scored_below(&key, cutoff).await {
                warn!(error = %e, key = %key, "prefix sweep failed for key");
            }
        }
    }
}
