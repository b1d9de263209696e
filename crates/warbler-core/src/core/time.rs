// crates/warbler-core/src/core/time.rs
// ============================================================================
// Module: Warbler Time Model
// Description: Message timestamps stored as unix epoch milliseconds.
// Purpose: Keep a single timestamp representation between store and views.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Messages are stamped when they are created. The store persists the value
//! as unix epoch milliseconds; the web layer renders it as a calendar date.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::macros::format_description;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Message timestamp in unix epoch milliseconds.
///
/// # Invariants
/// - Values before the epoch are representable but never produced by [`Timestamp::now`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self(i64::try_from(now.as_millis()).unwrap_or(i64::MAX))
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Formats the timestamp as a day-month-year label (for example `05 March 2024`).
    ///
    /// Out-of-range values render as an empty string.
    #[must_use]
    pub fn display_date(self) -> String {
        let nanos = i128::from(self.0) * 1_000_000;
        let Ok(datetime) = OffsetDateTime::from_unix_timestamp_nanos(nanos) else {
            return String::new();
        };
        datetime
            .format(format_description!("[day] [month repr:long] [year]"))
            .unwrap_or_default()
    }
}
