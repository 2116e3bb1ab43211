//! bh2e - Black Hack 2e rules engine
//!
//! An initiative-bag turn scheduler and a dice resolution engine (attacks,
//! attribute tests, usage dice) that plug into a host platform through async
//! traits, plus a small daemon exposing them over JSON.

pub mod api;
pub mod config;
pub mod dice;
pub mod error;
pub mod host;
pub mod initiative;
pub mod model;
pub mod resolution;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use api::AppState;
pub use config::{Config, RulesConfig};
use dice::{DiceSource, RandomDice};
pub use error::RulesError;

/// The bh2ed server instance
pub struct Server {
    config: Config,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance rolling real dice
    pub fn new(config: Config) -> Self {
        Self::with_dice(config, Arc::new(RandomDice))
    }

    /// Create a server with a specific dice source
    pub fn with_dice(config: Config, dice: Arc<dyn DiceSource>) -> Self {
        let state = AppState::new(config.rules.clone(), dice);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            config,
            state,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Get the shared application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router
    pub fn router(&self) -> Router {
        api::router(self.state.clone())
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("bh2ed listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("bh2ed shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
