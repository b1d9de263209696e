// crates/warbler-web/src/lib.rs
// ============================================================================
// Module: Warbler Web Library
// Description: HTTP application for the Warbler social network.
// Purpose: Expose accounts, follows, messages, and likes as HTML pages.
// Dependencies: axum, tera, warbler-core, warbler-config
// ============================================================================

//! ## Overview
//! `warbler-web` wires the store and account operations into an axum
//! [`axum::Router`]. Requests carry a signed session cookie ([`session`]),
//! handlers resolve the current user through [`context::RequestContext`], and
//! pages are rendered from embedded tera templates ([`templates`]).
//!
//! Security posture: cookies and form inputs are untrusted. Session cookies
//! are HMAC-signed and form posts carry a CSRF token when enabled.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod context;
pub mod error;
pub mod forms;
pub mod routes;
pub mod server;
pub mod session;
pub mod state;
pub mod templates;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use context::RequestContext;
pub use error::WebError;
pub use routes::router;
pub use server::ServerError;
pub use server::WarblerServer;
pub use session::Flash;
pub use session::FlashCategory;
pub use session::Session;
pub use session::SessionCodec;
pub use state::AppState;
