// crates/warbler-web/src/server.rs
// ============================================================================
// Module: Warbler Server
// Description: Server construction from config and the HTTP serve loop.
// Purpose: Open the store, build the router, and serve until shutdown.
// Dependencies: axum, tokio, warbler-config, warbler-store-sqlite
// ============================================================================

//! ## Overview
//! [`WarblerServer::from_config`] validates configuration, opens the `SQLite`
//! store, and prepares application state. [`WarblerServer::serve`] binds the
//! configured address and runs until Ctrl-C.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;
use warbler_config::WarblerConfig;
use warbler_store_sqlite::SqliteWarblerStore;

use crate::routes::router;
use crate::state::AppState;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration was invalid.
    #[error("config error: {0}")]
    Config(String),
    /// Startup failed.
    #[error("init error: {0}")]
    Init(String),
    /// Socket or serve loop failure.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Warbler HTTP server.
pub struct WarblerServer {
    /// Address to bind.
    bind: SocketAddr,
    /// Application state.
    state: AppState,
}

impl WarblerServer {
    /// Builds a server backed by the configured `SQLite` store.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when configuration or initialization fails.
    pub fn from_config(mut config: WarblerConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let bind = config.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = SqliteWarblerStore::new(config.store.clone())
            .map_err(|err| ServerError::Init(err.to_string()))?;
        if config.session.secret_generated {
            tracing::warn!(
                "session.secret_key not configured; generated a per-process key, sessions end \
                 on restart"
            );
        }
        let state = AppState::new(config, Arc::new(store))
            .map_err(|err| ServerError::Init(err.to_string()))?;
        Ok(Self {
            bind,
            state,
        })
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Returns the application router.
    #[must_use]
    pub fn app(&self) -> Router {
        router(self.state.clone())
    }

    /// Binds the configured address and serves until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_on(listener).await
    }

    /// Serves on an already-bound listener until Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when serving fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        let local = listener.local_addr().map_err(|err| ServerError::Transport(err.to_string()))?;
        tracing::info!(addr = %local, "warbler listening");
        axum::serve(listener, self.app())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))?;
        tracing::info!("warbler stopped");
        Ok(())
    }
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
