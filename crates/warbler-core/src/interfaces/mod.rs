// crates/warbler-core/src/interfaces/mod.rs
// ============================================================================
// Module: Warbler Interfaces
// Description: Persistence contract for the social graph.
// Purpose: Decouple account and web logic from the concrete database.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! [`WarblerStore`] is the single seam between Warbler logic and durable
//! storage. Implementations must enforce uniqueness of usernames, emails,
//! follow edges and likes, and cascade deletes from users to their messages,
//! follow edges and likes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::MessageId;
use crate::core::identifiers::UserId;
use crate::core::records::FeedItem;
use crate::core::records::Message;
use crate::core::records::NewMessage;
use crate::core::records::NewUser;
use crate::core::records::ProfileUpdate;
use crate::core::records::User;
use crate::core::records::UserStats;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Messages never embed password hashes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store I/O error.
    #[error("warbler store io error: {0}")]
    Io(String),
    /// Database engine error.
    #[error("warbler store db error: {0}")]
    Db(String),
    /// Unique constraint violation.
    #[error("warbler store conflict: {0}")]
    Conflict(String),
    /// Referenced record does not exist.
    #[error("warbler store not found: {0}")]
    NotFound(String),
    /// Request rejected as invalid.
    #[error("warbler store invalid data: {0}")]
    Invalid(String),
    /// Stored data failed to decode.
    #[error("warbler store corruption: {0}")]
    Corrupt(String),
    /// Schema version is incompatible.
    #[error("warbler store version mismatch: {0}")]
    VersionMismatch(String),
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Persistence interface for users, messages, follows, and likes.
pub trait WarblerStore: Send + Sync {
    /// Inserts a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the username or email is taken.
    fn create_user(&self, user: &NewUser) -> Result<User, StoreError>;

    /// Loads a user by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Loads a user by exact username.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Lists users, optionally filtered by a case-insensitive username substring.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn list_users(&self, search: Option<&str>) -> Result<Vec<User>, StoreError>;

    /// Updates editable profile fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for unknown users and
    /// [`StoreError::Conflict`] when the new username or email is taken.
    fn update_user(&self, id: UserId, update: &ProfileUpdate) -> Result<User, StoreError>;

    /// Deletes a user and everything that references them. Returns `false` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when deletion fails.
    fn delete_user(&self, id: UserId) -> Result<bool, StoreError>;

    /// Returns profile counters for a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn user_stats(&self, id: UserId) -> Result<UserStats, StoreError>;

    /// Records that `follower` follows `followed`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for self-follows and
    /// [`StoreError::NotFound`] when either user is missing.
    fn follow(&self, follower: UserId, followed: UserId) -> Result<(), StoreError>;

    /// Removes a follow edge. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when deletion fails.
    fn unfollow(&self, follower: UserId, followed: UserId) -> Result<bool, StoreError>;

    /// Lists users that `user` follows.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn following(&self, user: UserId) -> Result<Vec<User>, StoreError>;

    /// Lists users following `user`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn followers(&self, user: UserId) -> Result<Vec<User>, StoreError>;

    /// Returns true when `follower` follows `followed`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn is_following(&self, follower: UserId, followed: UserId) -> Result<bool, StoreError>;

    /// Returns true when `user` is followed by `other`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn is_followed_by(&self, user: UserId, other: UserId) -> Result<bool, StoreError> {
        self.is_following(other, user)
    }

    /// Inserts a message stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the author does not exist.
    fn create_message(&self, message: &NewMessage) -> Result<Message, StoreError>;

    /// Loads a message by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn message(&self, id: MessageId) -> Result<Option<Message>, StoreError>;

    /// Deletes a message and its likes. Returns `false` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when deletion fails.
    fn delete_message(&self, id: MessageId) -> Result<bool, StoreError>;

    /// Lists a user's messages, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn messages_by_user(&self, user: UserId, limit: usize) -> Result<Vec<Message>, StoreError>;

    /// Lists messages by users `viewer` follows plus the viewer's own, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn timeline(&self, viewer: UserId, limit: usize) -> Result<Vec<FeedItem>, StoreError>;

    /// Records that `user` likes `message`. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when the user or message is missing.
    fn like(&self, user: UserId, message: MessageId) -> Result<(), StoreError>;

    /// Removes a like. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when deletion fails.
    fn unlike(&self, user: UserId, message: MessageId) -> Result<bool, StoreError>;

    /// Returns true when `user` likes `message`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn has_liked(&self, user: UserId, message: MessageId) -> Result<bool, StoreError>;

    /// Lists identifiers of messages `user` liked.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn liked_message_ids(&self, user: UserId) -> Result<Vec<MessageId>, StoreError>;

    /// Lists messages `user` liked, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn liked_messages(&self, user: UserId, limit: usize) -> Result<Vec<FeedItem>, StoreError>;

    /// Lists users that liked `message`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn likes_for_message(&self, message: MessageId) -> Result<Vec<UserId>, StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
