// crates/warbler-web/src/state.rs
// ============================================================================
// Module: Application State
// Description: Shared handles passed to every request handler.
// Purpose: Bundle store, hasher, templates, and session codec.
// Dependencies: tera, warbler-config, warbler-core
// ============================================================================

//! ## Overview
//! [`AppState`] is cheap to clone; each field is reference counted so axum
//! can hand a copy to every handler.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use tera::Tera;
use warbler_config::WarblerConfig;
use warbler_core::Argon2PasswordHasher;
use warbler_core::PasswordHasher;
use warbler_core::WarblerStore;

use crate::error::WebError;
use crate::session::SessionCodec;
use crate::templates::load_templates;

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Validated configuration.
    pub config: Arc<WarblerConfig>,
    /// Persistence backend.
    pub store: Arc<dyn WarblerStore>,
    /// Password hasher.
    pub hasher: Arc<dyn PasswordHasher>,
    /// Compiled templates.
    pub templates: Arc<Tera>,
    /// Session cookie codec.
    pub sessions: SessionCodec,
}

impl AppState {
    /// Builds application state with the default argon2 hasher.
    ///
    /// `config` must already be validated so the session secret is present.
    ///
    /// # Errors
    ///
    /// Returns [`WebError`] when templates fail to compile or the session key
    /// is rejected.
    pub fn new(config: WarblerConfig, store: Arc<dyn WarblerStore>) -> Result<Self, WebError> {
        Self::with_hasher(config, store, Arc::new(Argon2PasswordHasher::new()))
    }

    /// Builds application state with an explicit hasher.
    ///
    /// # Errors
    ///
    /// Returns [`WebError`] when templates fail to compile or the session key
    /// is rejected.
    pub fn with_hasher(
        config: WarblerConfig,
        store: Arc<dyn WarblerStore>,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Result<Self, WebError> {
        let sessions = SessionCodec::new(config.session.secret_bytes())
            .map_err(|err| WebError::Internal(err.to_string()))?;
        let templates = load_templates()?;
        Ok(Self {
            config: Arc::new(config),
            store,
            hasher,
            templates: Arc::new(templates),
            sessions,
        })
    }
}
