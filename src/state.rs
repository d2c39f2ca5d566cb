use std::sync::Arc;

use crate::{config::AppConfig, notify::Notifier, storage::ObjectStorage};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn ObjectStorage>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Arc<dyn ObjectStorage>, notifier: Notifier) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            notifier,
        }
    }
}
