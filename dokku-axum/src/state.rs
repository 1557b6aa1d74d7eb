use std::sync::Arc;

use dokku_auth::Keys;
use dokku_commands::Commands;
use dokku_core::{CommandExecutor, ResourceStore, Settings};

use crate::rate_limit::RateLimiter;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub commands: Commands,
    pub store: Arc<dyn ResourceStore>,
    pub keys: Keys,
    pub api_name: String,
    pub api_version: String,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        settings: &Settings,
        executor: Arc<dyn CommandExecutor>,
        store: Arc<dyn ResourceStore>,
    ) -> Self {
        let commands = Commands::new(executor, Arc::clone(&store))
            .with_namespacing(settings.namespacing)
            .with_volume_dir(settings.volume_dir.clone());

        Self {
            commands,
            store,
            keys: Keys::new(settings.api_key.clone(), settings.master_key.clone()),
            api_name: settings.api_name.clone(),
            api_version: settings.api_version.clone(),
            limiter: RateLimiter::per_minute(settings.rate_limit_per_minute),
        }
    }
}
