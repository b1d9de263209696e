// crates/warbler-core/src/core/records.rs
// ============================================================================
// Module: Warbler Records
// Description: Users, messages, and derived read models.
// Purpose: Plain data records exchanged with the store.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Records mirror the persisted rows. Insert payloads (`New*`) carry only the
//! caller-supplied columns; the store assigns identifiers and timestamps.
//! [`User`] holds the password hash and intentionally does not implement
//! `Serialize`, so it can never be rendered into a page by accident.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::core::identifiers::MessageId;
use crate::core::identifiers::UserId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Profile image used when a user does not supply one.
pub const DEFAULT_IMAGE_URL: &str = "/static/images/default-pic.png";
/// Header image used when a user does not supply one.
pub const DEFAULT_HEADER_IMAGE_URL: &str = "/static/images/warbler-hero.jpg";
/// Maximum message length in characters.
pub const MAX_MESSAGE_LENGTH: usize = 140;

// ============================================================================
// SECTION: Users
// ============================================================================

/// Registered user.
///
/// # Invariants
/// - `username` and `email` are unique across users and non-empty.
/// - `password_hash` is a PHC-format hash string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Unique handle shown as `@username`.
    pub username: String,
    /// Unique email address.
    pub email: String,
    /// Profile image URL.
    pub image_url: String,
    /// Profile header image URL.
    pub header_image_url: String,
    /// Free-form biography.
    pub bio: Option<String>,
    /// Free-form location.
    pub location: Option<String>,
    /// Salted password hash.
    pub password_hash: String,
}

/// Insert payload for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Requested username.
    pub username: String,
    /// Requested email address.
    pub email: String,
    /// Already-hashed password.
    pub password_hash: String,
    /// Optional profile image URL (defaults to [`DEFAULT_IMAGE_URL`]).
    pub image_url: Option<String>,
}

/// Editable profile fields.
///
/// # Invariants
/// - Empty image URLs are replaced by the defaults before storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New username.
    pub username: String,
    /// New email address.
    pub email: String,
    /// New profile image URL.
    pub image_url: String,
    /// New header image URL.
    pub header_image_url: String,
    /// New biography.
    pub bio: Option<String>,
    /// New location.
    pub location: Option<String>,
}

impl ProfileUpdate {
    /// Replaces blank image URLs with the defaults and blank text with `None`.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        if self.image_url.trim().is_empty() {
            DEFAULT_IMAGE_URL.clone_into(&mut self.image_url);
        }
        if self.header_image_url.trim().is_empty() {
            DEFAULT_HEADER_IMAGE_URL.clone_into(&mut self.header_image_url);
        }
        self.bio = self.bio.filter(|value| !value.trim().is_empty());
        self.location = self.location.filter(|value| !value.trim().is_empty());
        self
    }
}

/// Aggregate counters shown on a profile page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    /// Messages authored by the user.
    pub messages: u64,
    /// Users this user follows.
    pub following: u64,
    /// Users following this user.
    pub followers: u64,
    /// Messages this user liked.
    pub likes: u64,
}

// ============================================================================
// SECTION: Messages
// ============================================================================

/// Posted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Message identifier.
    pub id: MessageId,
    /// Message body.
    pub text: String,
    /// Creation time.
    pub timestamp: Timestamp,
    /// Author identifier.
    pub user_id: UserId,
}

/// Insert payload for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    /// Author identifier.
    pub user_id: UserId,
    /// Message body.
    pub text: String,
}

/// Message joined with its author's display fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedItem {
    /// The message.
    pub message: Message,
    /// Author username.
    pub author_username: String,
    /// Author profile image URL.
    pub author_image_url: String,
}
