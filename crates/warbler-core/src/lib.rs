// crates/warbler-core/src/lib.rs
// ============================================================================
// Module: Warbler Core Library
// Description: Domain records, store interface, and account operations.
// Purpose: Define the data model shared by the store, web, and CLI crates.
// Dependencies: argon2, rand, serde, thiserror, time
// ============================================================================

//! ## Overview
//! Warbler core defines the social graph data model: users, messages, follow
//! edges, and likes. Persistence is abstracted behind [`WarblerStore`]; account
//! operations ([`accounts::signup`], [`accounts::authenticate`]) are written
//! against that trait and a [`PasswordHasher`].
//! Invariants:
//! - Identifiers are non-zero and 1-based.
//! - Stored passwords are always salted hashes, never plaintext.
//! - Follow edges are directional.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod accounts;
pub mod core;
pub mod hashing;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use accounts::AccountError;
pub use accounts::SignupRequest;
pub use core::identifiers::MessageId;
pub use core::identifiers::UserId;
pub use core::records::DEFAULT_HEADER_IMAGE_URL;
pub use core::records::DEFAULT_IMAGE_URL;
pub use core::records::FeedItem;
pub use core::records::MAX_MESSAGE_LENGTH;
pub use core::records::Message;
pub use core::records::NewMessage;
pub use core::records::NewUser;
pub use core::records::ProfileUpdate;
pub use core::records::User;
pub use core::records::UserStats;
pub use core::time::Timestamp;
pub use hashing::Argon2PasswordHasher;
pub use hashing::HashError;
pub use hashing::PasswordHasher;
pub use interfaces::StoreError;
pub use interfaces::WarblerStore;
pub use runtime::InMemoryWarblerStore;
