use std::sync::Arc;
use tracing::info;
use tripindex::config::{Config, StoreBackend};
use tripindex::planner::Planner;
use tripindex::store::Store;
use tripindex::writer::Writer;
use tripindex_server::state::AppState;
use tripindex_server::sweep::{self, TouchedPrefixes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(Config::log_filter())
                .unwrap_or_else(|_| "tripindex_server=info,tripindex=info,info".into()),
        )
        .init();

    let store: Arc<dyn Store> = match config.store_backend {
        StoreBackend::Memory => {
            info!("using in-memory store");
            Arc::new(tripindex::store::MemoryStore::new())
        }
        #[cfg(feature = "redis-backend")]
        StoreBackend::Redis => {
            info!(url = %config.redis_url, db = config.redis_db_num, "connecting to redis");
            Arc::new(
                tripindex::store::RedisStore::connect(&config.redis_url, config.redis_db_num)
                    .await?,
            )
        }
        #[cfg(not(feature = "redis-backend"))]
        StoreBackend::Redis => {
            anyhow::bail!("STORE_BACKEND=redis requires the redis-backend feature");
        }
    };

    let writer = Arc::new(Writer::new(store.clone(), config.snapshot_retention));
    let planner = Arc::new(Planner::new(store.clone()));

    let touched_prefixes = config.prefix_sweep_interval.map(|_| Arc::new(TouchedPrefixes::new()));
    if let (Some(interval), Some(touched)) =
        (config.prefix_sweep_interval, touched_prefixes.clone())
    {
        let store = store.clone();
        let retention = config.snapshot_retention;
        tokio::spawn(async move {
            sweep::run(store, touched, interval, retention).await;
        });
    }

    let state = AppState {
        writer,
        planner,
        touched_prefixes,
    };

    let addr = format!("{}:{}", config.http_host, config.http_port).parse()?;
    tripindex_server::run_server(addr, state).await
}
