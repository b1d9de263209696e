// crates/warbler-core/src/accounts.rs
// ============================================================================
// Module: Warbler Accounts
// Description: User signup and credential authentication.
// Purpose: Own the rules for creating users and checking passwords.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Account operations sit on top of [`WarblerStore`] and [`PasswordHasher`]:
//! - [`signup`] validates required fields, hashes the password, and inserts
//!   the user. Uniqueness is enforced by the store.
//! - [`authenticate`] looks a user up by username and verifies the password.
//!   Unknown users and wrong passwords are indistinguishable to callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::records::NewUser;
use crate::core::records::User;
use crate::hashing::HashError;
use crate::hashing::PasswordHasher;
use crate::interfaces::StoreError;
use crate::interfaces::WarblerStore;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Account operation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccountError {
    /// Password was empty.
    #[error("password must not be empty")]
    InvalidPassword,
    /// A required field was empty.
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    /// Username or email already registered.
    #[error("username or email already taken")]
    Conflict,
    /// Password hashing failed.
    #[error(transparent)]
    Hash(#[from] HashError),
    /// Store failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict(_) => Self::Conflict,
            other => Self::Store(other),
        }
    }
}

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Signup input as submitted by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupRequest {
    /// Requested username.
    pub username: String,
    /// Requested email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Optional profile image URL; blank means "use the default".
    pub image_url: Option<String>,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Registers a new user with a hashed password.
///
/// # Errors
///
/// Returns [`AccountError::InvalidPassword`] for an empty password,
/// [`AccountError::MissingField`] for an empty username or email, and
/// [`AccountError::Conflict`] when the username or email is already taken.
pub fn signup<S, H>(store: &S, hasher: &H, request: SignupRequest) -> Result<User, AccountError>
where
    S: WarblerStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    if request.password.is_empty() {
        return Err(AccountError::InvalidPassword);
    }
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AccountError::MissingField("username"));
    }
    let email = request.email.trim();
    if email.is_empty() {
        return Err(AccountError::MissingField("email"));
    }
    let password_hash = hasher.hash(&request.password)?;
    let new_user = NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash,
        image_url: request.image_url.filter(|url| !url.trim().is_empty()),
    };
    Ok(store.create_user(&new_user)?)
}

/// Returns the user when `username` exists and `password` matches.
///
/// # Errors
///
/// Returns [`AccountError`] when the store fails or the stored hash is malformed.
pub fn authenticate<S, H>(
    store: &S,
    hasher: &H,
    username: &str,
    password: &str,
) -> Result<Option<User>, AccountError>
where
    S: WarblerStore + ?Sized,
    H: PasswordHasher + ?Sized,
{
    let Some(user) = store.user_by_username(username)? else {
        return Ok(None);
    };
    if hasher.verify(password, &user.password_hash)? { Ok(Some(user)) } else { Ok(None) }
}
