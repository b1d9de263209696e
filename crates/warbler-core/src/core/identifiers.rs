// crates/warbler-core/src/core/identifiers.rs
// ============================================================================
// Module: Warbler Identifiers
// Description: Canonical numeric identifiers for users and messages.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Users and messages are keyed by database-assigned integers. The wrappers in
//! this module keep the two id spaces apart at compile time and enforce the
//! non-zero, 1-based invariant at construction boundaries (route parameters,
//! session payloads, database rows).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// User identifier.
///
/// # Invariants
/// - Always >= 1 (non-zero, 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(NonZeroU64);

impl UserId {
    /// Creates a new user identifier from a non-zero value.
    #[must_use]
    pub const fn new(id: NonZeroU64) -> Self {
        Self(id)
    }

    /// Creates a user identifier from a raw value (returns `None` if zero).
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Creates a user identifier from a database row id (returns `None` if not positive).
    #[must_use]
    pub fn from_row(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().and_then(Self::from_raw)
    }

    /// Returns the raw identifier value (always >= 1).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Returns the identifier as a database row id.
    #[must_use]
    pub fn to_row(self) -> i64 {
        i64::try_from(self.0.get()).unwrap_or(i64::MAX)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.get().fmt(f)
    }
}

impl FromStr for UserId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.parse::<u64>().map_err(|err| err.to_string())?;
        Self::from_raw(raw).ok_or_else(|| "user id must be non-zero".to_string())
    }
}

/// Message identifier.
///
/// # Invariants
/// - Always >= 1 (non-zero, 1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(NonZeroU64);

impl MessageId {
    /// Creates a new message identifier from a non-zero value.
    #[must_use]
    pub const fn new(id: NonZeroU64) -> Self {
        Self(id)
    }

    /// Creates a message identifier from a raw value (returns `None` if zero).
    #[must_use]
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// Creates a message identifier from a database row id (returns `None` if not positive).
    #[must_use]
    pub fn from_row(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().and_then(Self::from_raw)
    }

    /// Returns the raw identifier value (always >= 1).
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Returns the identifier as a database row id.
    #[must_use]
    pub fn to_row(self) -> i64 {
        i64::try_from(self.0.get()).unwrap_or(i64::MAX)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.get().fmt(f)
    }
}

impl FromStr for MessageId {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let raw = value.parse::<u64>().map_err(|err| err.to_string())?;
        Self::from_raw(raw).ok_or_else(|| "message id must be non-zero".to_string())
    }
}
