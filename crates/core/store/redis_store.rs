//! Redis-backed [`Store`] for production deployments.

use super::Store;
use crate::error::StoreError;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError};
use std::time::Duration;

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        if err.is_timeout() {
            StoreError::Timeout
        } else {
            StoreError::Backend(err.to_string())
        }
    }
}

/// Maximum number of `WATCH`/`MULTI`/`EXEC` attempts before
/// [`Store::transact_counter`] gives up (§9: the reference system retries
/// unboundedly, which we deliberately bound).
const MAX_TRANSACT_ATTEMPTS: u32 = 20;

pub struct RedisStore {
    client: Client,
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(redis_url: &str, db_num: u32) -> Result<Self, StoreError> {
        let client = Client::open(redis_url).map_err(StoreError::from)?;
        let mut conn = client
            .get_connection_manager()
            .await
            .map_err(StoreError::from)?;
        let _: () = redis::cmd("SELECT")
            .arg(db_num)
            .query_async(&mut conn)
            .await
            .map_err(StoreError::from)?;
        Ok(Self { client, conn })
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.exists(key).await?)
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, 1).await?)
    }

    async fn incr_by_float(&self, key: &str, delta: f64) -> Result<f64, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.incr(key, delta).await?)
    }

    async fn zadd(&self, key: &str, score: f64, member: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.zadd(key, member, score).await?;
        Ok(())
    }

    async fn zrange(&self, key: &str, start: i64, stop: i64) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.zrange(key, start as isize, stop as isize).await?)
    }

    async fn zcard(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.zcard(key).await?)
    }

    async fn zrank(&self, key: &str, member: &str) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.clone();
        Ok(conn.zrank(key, member).await?)
    }

    async fn zrem(&self, key: &str, member: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.zrem(key, member).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.expire(key, ttl.as_secs().max(1) as i64).await?;
        Ok(())
    }

    async fn remove_scored_below(&self, key: &str, cutoff: f64) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.zrembyscore(key, f64::NEG_INFINITY, cutoff).await?;
        Ok(())
    }

    /// `WATCH` is scoped to the connection it's issued on, so this opens a
    /// dedicated connection per call rather than borrowing the shared
    /// `ConnectionManager` — a multiplexed connection could have its watch
    /// broken by an unrelated command issued concurrently on the same socket.
    async fn transact_counter(
        &self,
        counter_key: &str,
        snapshot_key: &str,
        ttl: Duration,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut conn = self
            .client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(StoreError::from)?;

        for _ in 0..MAX_TRANSACT_ATTEMPTS {
            let _: () = redis::cmd("WATCH")
                .arg(counter_key)
                .query_async(&mut conn)
                .await?;

            let current: Option<i64> = redis::cmd("GET")
                .arg(counter_key)
                .query_async(&mut conn)
                .await?;
            let next = current.unwrap_or(0) + delta;

            let result: Option<()> = redis::pipe()
                .atomic()
                .set(counter_key, next)
                .set_ex(snapshot_key, next, ttl.as_secs().max(1))
                .query_async(&mut conn)
                .await?;

            if result.is_some() {
                return Ok(next);
            }
            // EXEC returned nil: another writer touched counter_key between WATCH
            // and EXEC. Retry from the read.
        }

        Err(StoreError::TransactionExhausted(MAX_TRANSACT_ATTEMPTS))
    }

    async fn predecessor(&self, key: &str, ts: i64) -> Result<Option<i64>, StoreError> {
        let mut conn = self.conn.clone();
        let members: Vec<String> = conn
            .zrevrangebyscore_limit(key, ts, i64::MIN, 0, 1)
            .await?;
        Ok(members.into_iter().next().and_then(|s| s.parse().ok()))
    }
}
