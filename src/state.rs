use std::sync::Arc;

use crate::broadcast::Broadcaster;
use crate::config::Config;
use crate::directory::UserDirectory;
use crate::engine::LifecycleEngine;
use crate::observability::metrics::Metrics;
use crate::store::{InMemoryParcelStore, ParcelStore};

pub struct AppState {
    pub store: Arc<dyn ParcelStore>,
    pub directory: Arc<UserDirectory>,
    pub broadcaster: Broadcaster,
    pub engine: LifecycleEngine,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self::with_store(Arc::new(InMemoryParcelStore::new()), config)
    }

    pub fn with_store(store: Arc<dyn ParcelStore>, config: &Config) -> Self {
        let directory = Arc::new(UserDirectory::new());
        let broadcaster = Broadcaster::new(config.event_buffer_size);
        let metrics = Metrics::new();

        let engine = LifecycleEngine::new(
            store.clone(),
            directory.clone(),
            broadcaster.clone(),
            metrics.clone(),
            config.transition_policy,
            config.max_save_retries,
        );

        Self {
            store,
            directory,
            broadcaster,
            engine,
            metrics,
        }
    }
}
