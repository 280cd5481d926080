//! In-memory [`Store`] — the dependency-injected fake used by tests and local
//! development without an external Redis (§9).

use super::Store;
use crate::error::StoreError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Value {
    Scalar(String),
    ZSet(Vec<(f64, String)>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

impl Entry {
    fn scalar(value: String) -> Self {
        Self {
            value: Value::Scalar(value),
            expires_at: None,
        }
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// A single-process, mutex-guarded [`Store`]. The whole store is guarded by one
/// lock, so [`Store::transact_counter`] is trivially atomic here — no retry loop
/// is needed because no concurrent writer can observe a torn update.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_live(data: &mut HashMap<String, Entry>, key: &str) -> Option<Entry> {
        let now = Instant::now();
        match data.get(key) {
            Some(e) if e.is_expired(now) => {
                data.remove(key);
                None
            }
            Some(e) => Some(e.clone()),
            None => None,
        }
    }
}

fn zset_rank(set: &[(f64, String)], member: &str) -> Option<i64> {
    set.iter().position(|(_, m)| m == member).map(|i| i as i64)
}

fn zrange_indices(len: usize, start: i64, stop: i64) -> (usize, usize) {
    let norm = |i: i64| -> i64 {
        if i < 0 {
            (len as i64 + i).max(0)
        } else {
            i
        }
    };
    let start = norm(start).min(len as i64) as usize;
    let stop = norm(stop).min(len as i64 - 1).max(-1);
    if stop < 0 {
        (1, 0) // empty range
    } else {
        (start, stop as usize)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut data = self.data.lock();
        Ok(Self::get_live(&mut data, key).and_then(|e| match e.value {
            Value::Scalar(s) => Some(s),
            Value::ZSet(_) => None,
        }))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.data
            .lock()
            .insert(key.to_string(), Entry::scalar(value.to_string()));
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut entry = Entry::scalar(value.to_string());
        entry.expires_at = Some(Instant::now() + ttl);
        self.data.lock().insert(key.to_string(), entry);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut data = self.data.lock();
        Ok(Self::get_live(&mut data, key).is_some())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut data = self.data.lock();
        let current = Self::get_live(&mut data, key)
            .and_then(|e| match e.value {
                Value::Scalar(s) => s.parse::<i64>().ok(),
                Value::ZSet(_) => None,
            })
            .unwrap_or(0);
        let next = current + 1;
        data.insert(key.to_string(), Entry::scalar(next.to_string()));
        Ok(next)
    }

    async fn incr_by_float(&self, key: &str, delta: f64) -> Result<f64, StoreError> {
        let mut data = self.data.lock();
        let current = Self::get_live(&mut data, key)
            .and_then(|e| match e.value {
                Value::Scalar(s) => s.parse::<f64>().ok(),
                Value::ZSet(_) => None,
            })
            .unwrap_or(0.0);
        let next = current + delta;
        data.insert(key.to_string(), Entry::scalar(next.to_string()));
        Ok(next)
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock();
        let mut entry = Self::get_live(&mut data, key).unwrap_or(Entry {
            value: Value::ZSet(Vec::new()),
            expires_at: None,
        });
        let Value::ZSet(set) = &mut entry.value else {
            return Err(StoreError::Backend(format!(
                "key {key} holds a scalar, not a set"
            )));
        };
        set.retain(|(_, m)| m != member);
        let pos = set
            .partition_point(|(s, m)| (*s, m.as_str()) < (score, member));
        set.insert(pos, (score, member.to_string()));
        data.insert(key.to_string(), entry);
        Ok(())
    }

    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        let mut data = self.data.lock();
        let Some(Entry {
            value: Value::ZSet(set),
            ..
        }) = Self::get_live(&mut data, key)
        else {
            return Ok(Vec::new());
        };
        let (lo, hi) = zrange_indices(set.len(), start, stop);
        if lo > hi {
            return Ok(Vec::new());
        }
        Ok(set[lo..=hi].iter().map(|(_, m)| m.clone()).collect())
    }

    async fn zcard(&self, key: &str) -> Result<usize, StoreError> {
        let mut data = self.data.lock();
        Ok(match Self::get_live(&mut data, key) {
            Some(Entry {
                value: Value::ZSet(set),
                ..
            }) => set.len(),
            _ => 0,
        })
    }

    async fn zrank(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        let mut data = self.data.lock();
        Ok(match Self::get_live(&mut data, key) {
            Some(Entry {
                value: Value::ZSet(set),
                ..
            }) => zset_rank(&set, member),
            _ => None,
        })
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock();
        if let Some(mut entry) = Self::get_live(&mut data, key) {
            if let Value::ZSet(set) = &mut entry.value {
                set.retain(|(_, m)| m != member);
            }
            data.insert(key.to_string(), entry);
        }
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut data = self.data.lock();
        if let Some(entry) = data.get_mut(key) {
            entry.expires_at = Some(Instant::now() + ttl);
        }
        Ok(())
    }

    async fn remove_scored_below(&self, key: &str, cutoff: f64) -> Result<(), StoreError> {
        let mut data = self.data.lock();
        if let Some(entry) = data.get_mut(key) {
            if let Value::ZSet(set) = &mut entry.value {
                set.retain(|(score, _)| *score >= cutoff);
            }
        }
        Ok(())
    }

    async fn transact_counter(
        &self,
        counter_key: &str,
        snapshot_key: &str,
        ttl: Duration,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut data = self.data.lock();
        let current = Self::get_live(&mut data, counter_key)
            .and_then(|e| match e.value {
                Value::Scalar(s) => s.parse::<i64>().ok(),
                Value::ZSet(_) => None,
            })
            .unwrap_or(0);
        let next = current + delta;
        data.insert(counter_key.to_string(), Entry::scalar(next.to_string()));
        let mut snapshot = Entry::scalar(next.to_string());
        snapshot.expires_at = Some(Instant::now() + ttl);
        data.insert(snapshot_key.to_string(), snapshot);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn incr_begins_from_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.incr("c").await.unwrap(), 1);
        assert_eq!(store.incr("c").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn zadd_then_zrange_round_trips() {
        let store = MemoryStore::new();
        store.zadd("s", 5.0, "a").await.unwrap();
        store.zadd("s", 1.0, "b").await.unwrap();
        assert_eq!(
            store.zrange("s", 0, -1).await.unwrap(),
            vec!["b".to_string(), "a".to_string()]
        );
        assert_eq!(store.zcard("s").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn zadd_same_member_updates_score_not_cardinality() {
        let store = MemoryStore::new();
        store.zadd("s", 1.0, "a").await.unwrap();
        store.zadd("s", 2.0, "a").await.unwrap();
        assert_eq!(store.zcard("s").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn predecessor_finds_greatest_score_leq_target() {
        let store = MemoryStore::new();
        store.zadd("t", 10.0, "10").await.unwrap();
        store.zadd("t", 20.0, "20").await.unwrap();
        store.zadd("t", 30.0, "30").await.unwrap();
        assert_eq!(store.predecessor("t", 25).await.unwrap(), Some(20));
        assert_eq!(store.predecessor("t", 5).await.unwrap(), None);
        assert_eq!(store.predecessor("t", 20).await.unwrap(), Some(20));
        // probe member must not leak into the set
        assert_eq!(store.zcard("t").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn ttl_expires_keys() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "v", Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("v".to_string()));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn transact_counter_publishes_both_keys_atomically() {
        let store = MemoryStore::new();
        let v = store
            .transact_counter("cur", "snap:100", Duration::from_secs(90 * 86400), 1)
            .await
            .unwrap();
        assert_eq!(v, 1);
        assert_eq!(store.get("cur").await.unwrap(), Some("1".to_string()));
        assert_eq!(store.get("snap:100").await.unwrap(), Some("1".to_string()));
    }
}
