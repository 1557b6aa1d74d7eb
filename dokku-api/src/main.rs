use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dokku_axum::{AppState, DokkuApi};
use dokku_core::{ApiConfig, ResourceStore, Settings};
use dokku_ssh::SshExecutor;
use dokku_store::{MemoryStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_snapshot(&ApiConfig::from_env().snapshot());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if settings.api_key.is_none() {
        tracing::warn!("API_KEY is not set; tenant routes will reject every request");
    }
    if settings.master_key.is_none() {
        tracing::warn!("MASTER_KEY is not set; admin routes will reject every request");
    }

    let executor = Arc::new(SshExecutor::new(settings.ssh.clone()));
    let store: Arc<dyn ResourceStore> = match settings.database_url.as_deref() {
        Some(url) => Arc::new(SqliteStore::connect(url).await?),
        None => {
            tracing::warn!("DATABASE_URL is not set; tenants and quotas live in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    let state = AppState::new(&settings, executor, store);

    info!(
        ssh_host = %settings.ssh.hostname,
        ssh_port = settings.ssh.port,
        namespacing = ?settings.namespacing,
        "starting {} {}",
        settings.api_name,
        settings.api_version,
    );

    DokkuApi::new(state)
        .listen((settings.host.as_str(), settings.port))
        .await
}
