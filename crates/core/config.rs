//! Environment-variable configuration (§6), with typed defaults so the binary
//! runs with zero external dependencies out of the box.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub redis_db_num: u32,
    pub http_host: String,
    pub http_port: u16,
    pub store_backend: StoreBackend,
    pub prefix_sweep_interval: Option<Duration>,
    pub snapshot_retention: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379/0".to_string(),
            redis_db_num: 0,
            http_host: "0.0.0.0".to_string(),
            http_port: 6789,
            store_backend: StoreBackend::Memory,
            prefix_sweep_interval: None,
            snapshot_retention: Duration::from_secs(90 * 86400),
        }
    }
}

impl Config {
    /// Reads from the process environment, falling back to [`Config::default`]
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or(defaults.redis_url);
        let redis_db_num = std::env::var("REDIS_DB_NUM")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.redis_db_num);

        let http_host = std::env::var("HTTP_HOST").unwrap_or(defaults.http_host);
        let http_port = std::env::var("HTTP_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.http_port);

        let store_backend = match std::env::var("STORE_BACKEND").as_deref() {
            Ok("redis") => StoreBackend::Redis,
            _ => StoreBackend::Memory,
        };

        let prefix_sweep_interval = std::env::var("PREFIX_SWEEP_INTERVAL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .and_then(|secs| (secs > 0).then(|| Duration::from_secs(secs)));

        let snapshot_retention = std::env::var("SNAPSHOT_RETENTION_DAYS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|days| Duration::from_secs(days * 86400))
            .unwrap_or(defaults.snapshot_retention);

        Self {
            redis_url,
            redis_db_num,
            http_host,
            http_port,
            store_backend,
            prefix_sweep_interval,
            snapshot_retention,
        }
    }

    /// Reads `RUST_LOG`, falling back to `TRIPINDEX_LOG`, falling back to `info`.
    pub fn log_filter() -> String {
        std::env::var("RUST_LOG")
            .or_else(|_| std::env::var("TRIPINDEX_LOG"))
            .unwrap_or_else(|_| "info".to_string())
    }
}
