// crates/warbler-config/src/lib.rs
// ============================================================================
// Module: Warbler Config Library
// Description: Canonical config model, load guards, and validation.
// Purpose: Single source of truth for warbler.toml semantics.
// Dependencies: serde, toml, warbler-store-sqlite
// ============================================================================

//! ## Overview
//! `warbler-config` defines the configuration model for the Warbler server.
//! Loading is strict: oversized, non-UTF-8, or structurally invalid files
//! are rejected before any server state is built.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
