// crates/warbler-web/src/session.rs
// ============================================================================
// Module: Signed Sessions
// Description: Session payload, flash messages, and HMAC cookie codec.
// Purpose: Carry login state across requests without server-side storage.
// Dependencies: base64, hmac, rand, serde_json, sha2
// ============================================================================

//! ## Overview
//! A [`Session`] is serialized as JSON and sent to the browser as
//! `base64url(json) "." base64url(hmac_sha256(json))`. [`SessionCodec::decode`]
//! verifies the tag in constant time; anything that fails to verify or parse
//! decodes as `None` and callers start from an empty session.

// ============================================================================
// SECTION: Imports
// ============================================================================

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::Hmac;
use hmac::Mac;
use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;
use sha2::Sha256;
use thiserror::Error;
use warbler_core::UserId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// HMAC-SHA256 keyed MAC.
type HmacSha256 = Hmac<Sha256>;

/// Random bytes in a CSRF token.
const CSRF_TOKEN_BYTES: usize = 32;
/// Upper bound on an encoded session cookie value.
const MAX_COOKIE_VALUE_BYTES: usize = 4096;

// ============================================================================
// SECTION: Session State
// ============================================================================

/// Flash message category, rendered as a Bootstrap alert class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashCategory {
    /// Positive confirmation.
    Success,
    /// Error or denial.
    Danger,
    /// Neutral notice.
    Info,
    /// Caution.
    Warning,
}

/// One-shot message shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    /// Alert category.
    pub category: FlashCategory,
    /// Message text.
    pub text: String,
}

impl Flash {
    /// Builds a flash message.
    #[must_use]
    pub fn new(category: FlashCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

/// Per-browser session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Logged-in user, if any.
    #[serde(default)]
    pub user_id: Option<UserId>,
    /// Pending flash messages.
    #[serde(default)]
    pub flashes: Vec<Flash>,
    /// CSRF token bound to this session.
    #[serde(default)]
    pub csrf_token: Option<String>,
}

impl Session {
    /// Returns a session logged in as `user_id`.
    #[must_use]
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    /// Returns the CSRF token, creating one when absent.
    pub fn ensure_csrf_token(&mut self) -> &str {
        self.csrf_token.get_or_insert_with(generate_token)
    }
}

/// Generates a random URL-safe token.
fn generate_token() -> String {
    let mut bytes = [0_u8; CSRF_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

// ============================================================================
// SECTION: Codec
// ============================================================================

/// Session codec errors.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The signing key was rejected.
    #[error("session key invalid: {0}")]
    Key(String),
    /// The session could not be serialized.
    #[error("session encode failed: {0}")]
    Encode(String),
}

/// Signs and verifies session cookies.
///
/// # Invariants
/// - Only payloads tagged with this codec's key decode successfully.
#[derive(Clone)]
pub struct SessionCodec {
    /// Keyed MAC prototype, cloned per operation.
    mac: HmacSha256,
}

impl SessionCodec {
    /// Builds a codec from a signing key.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Key`] when the key is rejected by the MAC.
    pub fn new(key: &[u8]) -> Result<Self, SessionError> {
        let mac = HmacSha256::new_from_slice(key).map_err(|err| SessionError::Key(err.to_string()))?;
        Ok(Self {
            mac,
        })
    }

    /// Encodes a session into a cookie value.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Encode`] when serialization fails.
    pub fn encode(&self, session: &Session) -> Result<String, SessionError> {
        let payload =
            serde_json::to_vec(session).map_err(|err| SessionError::Encode(err.to_string()))?;
        let mut mac = self.mac.clone();
        mac.update(&payload);
        let tag = mac.finalize().into_bytes();
        Ok(format!("{}.{}", URL_SAFE_NO_PAD.encode(&payload), URL_SAFE_NO_PAD.encode(tag)))
    }

    /// Decodes a cookie value, returning `None` when it is malformed or forged.
    #[must_use]
    pub fn decode(&self, value: &str) -> Option<Session> {
        if value.len() > MAX_COOKIE_VALUE_BYTES {
            return None;
        }
        let (payload, tag) = value.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload).ok()?;
        let tag = URL_SAFE_NO_PAD.decode(tag).ok()?;
        let mut mac = self.mac.clone();
        mac.update(&payload);
        mac.verify_slice(&tag).ok()?;
        serde_json::from_slice(&payload).ok()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
