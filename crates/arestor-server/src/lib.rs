//! Arestor Server
//!
//! Serves the mocked metadata providers over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                 axum Router                      │
//! │   /healthz            fallback: handle_metadata  │
//! └──────────────────────────────────────────────────┘
//!                        │  mount prefix / default
//!                        ▼
//! ┌──────────────────────────────────────────────────┐
//! │          MetadataService (per provider)          │
//! │     ec2 tree        |      digitalocean tree     │
//! └──────────────────────────────────────────────────┘
//!                        │
//!                        ▼
//! ┌──────────────────────────────────────────────────┐
//! │        MemoryStore (seeded from config)          │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use arestor_server::{ServerConfig, run};
//!
//! let config = ServerConfig::load("/etc/arestor/arestor.toml")?;
//! let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
//! run(config, shutdown_rx).await?;
//! ```

pub mod api;
pub mod config;

pub use config::{ConfigError, ServerConfig};

use anyhow::Context;
use arestor_metadata::{KeyedStore, MemoryStore, MetadataService};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, info};

/// Shared state of the HTTP handlers
#[derive(Clone, Debug)]
pub struct AppState {
    mounts: Arc<BTreeMap<String, Arc<MetadataService>>>,
    default: Option<Arc<MetadataService>>,
}

impl AppState {
    /// Build one service per mounted provider over `store`
    pub fn new(config: &ServerConfig, store: Arc<dyn KeyedStore>) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut mounts = BTreeMap::new();
        let mut default = None;
        for (provider, prefix) in config.mounts()? {
            let service = Arc::new(MetadataService::new(provider, store.clone()));
            if config.default_provider == Some(provider) {
                default = Some(service.clone());
            }
            debug!(provider = %provider, prefix, "mounted provider");
            mounts.insert(prefix.to_string(), service);
        }

        Ok(Self {
            mounts: Arc::new(mounts),
            default,
        })
    }

    /// Pick the service for a request path
    ///
    /// A leading mount prefix wins; otherwise the default provider, if any,
    /// gets the whole path. Returns the service and the segments left for it.
    pub fn route<'a>(&self, segments: &'a [String]) -> Option<(&Arc<MetadataService>, &'a [String])> {
        if let Some((first, rest)) = segments.split_first() {
            if let Some(service) = self.mounts.get(first) {
                return Some((service, rest));
            }
        }
        self.default.as_ref().map(|service| (service, segments))
    }

    /// Mount prefixes, listed as collections
    pub fn listing(&self) -> Vec<String> {
        self.mounts.keys().map(|prefix| format!("{}/", prefix)).collect()
    }
}

/// Run the metadata server until `shutdown` fires
pub async fn run(config: ServerConfig, shutdown: watch::Receiver<()>) -> anyhow::Result<()> {
    let store: Arc<dyn KeyedStore> = Arc::new(MemoryStore::new());
    let seeded = config
        .seed_into(store.as_ref())
        .context("Failed to seed metadata store")?;
    info!(values = seeded, "Seeded metadata store");

    let state = AppState::new(&config, store).context("Invalid server configuration")?;

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen))?;
    serve(listener, state, shutdown).await
}

/// Serve on an already bound listener until `shutdown` fires
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    mut shutdown: watch::Receiver<()>,
) -> anyhow::Result<()> {
    let addr = listener.local_addr().context("Failed to read listener address")?;
    info!(addr = %addr, mounts = ?state.listing(), "Metadata service listening");

    let shutdown_signal = async move {
        let _ = shutdown.changed().await;
        info!("Shutdown signal received, stopping metadata service");
    };

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("Server error")?;

    info!("Metadata service stopped");
    Ok(())
}
