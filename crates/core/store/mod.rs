//! The `Store` trait: the exact set of ordered-set/counter operations (§6) this
//! system needs from a Redis-like key-value engine, abstracted so a fake can
//! stand in during tests (§9).

use crate::error::StoreError;
use async_trait::async_trait;
use std::time::Duration;

pub mod memory;
#[cfg(feature = "redis-backend")]
pub mod redis_store;

pub use memory::MemoryStore;
#[cfg(feature = "redis-backend")]
pub use redis_store::RedisStore;

/// The backing store's operation surface, as enumerated in §6.
///
/// Every method is a thin wrapper around a single round trip except
/// [`Store::transact_counter`], which models the reference system's
/// `WATCH`+`MULTI`+`EXEC` sequence: read the counter under a watch, compute the
/// next value, publish both the counter and its timestamped snapshot atomically,
/// and retry from the read on a conflicting concurrent write.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    async fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    async fn incr_by_float(&self, key: &str, delta: f64) -> Result<f64, StoreError>;

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<(), StoreError>;

    /// Redis-style inclusive index range; negative indices count from the end
    /// (`-1` is the last element).
    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError>;

    async fn zcard(&self, key: &str) -> Result<usize, StoreError>;

    async fn zrank(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError>;

    async fn zrem(&self, key: &str, member: &str) -> Result<(), StoreError>;

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError>;

    /// Remove members scored below `cutoff` (unix seconds). Used only by the
    /// optional background prefix-sweep task (§5) — not part of the required
    /// operation set, since correctness never depends on sweeping happening.
    async fn remove_scored_below(&self, key: &str, cutoff: f64) -> Result<(), StoreError>;

    /// Atomically publish `current = current + delta` to `counter_key` and mirror
    /// the result into `snapshot_key` (refreshing `ttl` on the snapshot), retrying
    /// on optimistic-lock conflict. Returns the published value.
    async fn transact_counter(
        &self,
        counter_key: &str,
        snapshot_key: &str,
        ttl: Duration,
        delta: i64,
    ) -> Result<i64, StoreError>;

    /// Find the greatest score `<= ts` stored in the ordered set at `key`.
    ///
    /// The default implementation is the reference system's mutate-probe
    /// pattern (insert a probe member at `ts`, read its rank, take the element
    /// one rank below, remove the probe) — a portability fallback for stores
    /// with no native reverse range-by-score. Backends that expose one should
    /// override this with a single round trip.
    ///
    /// The probe member is prefixed with a character (`~`) that sorts after
    /// every digit, so it never collides with a real member (members here are
    /// plain decimal timestamps) and, on a score tie, always ranks after the
    /// real member — otherwise a genuine element scored exactly `ts` would be
    /// shadowed by the probe and this would return the element before it
    /// instead of the element itself.
    async fn predecessor(&self, key: &str, ts: i64) -> Result<Option<i64>, StoreError> {
        let probe = format!("~predecessor-probe~{ts}");
        self.zadd(key, ts as f64, &probe).await?;
        let rank = self.zrank(key, &probe).await?;
        let found = match rank {
            Some(r) if r > 0 => self
                .zrange(key, r - 1, r - 1)
                .await?
                .into_iter()
                .next()
                .and_then(|s| s.parse::<i64>().ok()),
            _ => None,
        };
        self.zrem(key, &probe).await?;
        Ok(found)
    }
}
