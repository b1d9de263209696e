// crates/warbler-store-sqlite/src/lib.rs
// ============================================================================
// Module: Warbler SQLite Store Library
// Description: SQLite-backed WarblerStore implementation.
// Purpose: Persist users, messages, follows, and likes durably.
// Dependencies: rusqlite, serde, thiserror, warbler-core
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteWarblerStore`], the production implementation of
//! [`warbler_core::WarblerStore`]. Relational constraints (unique usernames and
//! emails, foreign keys with cascading deletes) are enforced by `SQLite` itself.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SCHEMA_VERSION;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
pub use store::SqliteWarblerStore;
