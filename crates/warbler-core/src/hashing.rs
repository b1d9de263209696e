// crates/warbler-core/src/hashing.rs
// ============================================================================
// Module: Warbler Password Hashing
// Description: Salted password hashing behind a pluggable trait.
// Purpose: Keep plaintext passwords out of the store.
// Dependencies: argon2, rand, thiserror
// ============================================================================

//! ## Overview
//! [`PasswordHasher`] abstracts the password hashing scheme used by signup and
//! authentication. [`Argon2PasswordHasher`] produces Argon2id PHC strings
//! (`$argon2id$v=19$...`) with a fresh 16-byte salt per hash.
//! Security posture: verification never distinguishes "unknown hash format"
//! from "wrong password" in user-facing output; callers only see `Ok(false)`
//! or an internal error.

// ============================================================================
// SECTION: Imports
// ============================================================================

use argon2::Argon2;
use argon2::password_hash::Error as PhcError;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as _;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use rand::RngCore;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Salt length in bytes.
const SALT_BYTES: usize = 16;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Password hashing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashError {
    /// The hashing backend failed.
    #[error("password hashing failed: {0}")]
    Hash(String),
    /// The stored hash could not be parsed.
    #[error("stored password hash is malformed: {0}")]
    Malformed(String),
}

// ============================================================================
// SECTION: Hasher
// ============================================================================

/// Password hashing scheme.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Hash`] when the backend fails.
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// Verifies a plaintext password against a stored hash.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Malformed`] when `hash` cannot be parsed.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError>;
}

/// Argon2id password hasher with default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2PasswordHasher;

impl Argon2PasswordHasher {
    /// Creates a new hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        let mut salt_bytes = [0u8; SALT_BYTES];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|err| HashError::Hash(err.to_string()))?;
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| HashError::Hash(err.to_string()))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(hash).map_err(|err| HashError::Malformed(err.to_string()))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(err) => Err(HashError::Malformed(err.to_string())),
        }
    }
}
