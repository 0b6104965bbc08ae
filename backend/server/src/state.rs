use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::{
    config::{Config, Storage},
    database::RedisBackend,
    store::Store,
};

pub struct State {
    pub config: Config,
    pub store: Store,
}

impl State {
    pub async fn new() -> Result<Arc<Self>> {
        let config = Config::load()?;

        let store = match config.storage {
            Storage::Redis => {
                info!("Connecting to Redis...");
                let backend = RedisBackend::connect(&config.redis_url)
                    .await
                    .context("Redis unreachable")?;
                Store::new(Arc::new(backend))
            }
            Storage::Memory => {
                warn!("Using in-memory storage, nothing will survive a restart");
                Store::memory()
            }
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Store) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
