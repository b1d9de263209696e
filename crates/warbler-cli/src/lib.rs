// crates/warbler-cli/src/lib.rs
// ============================================================================
// Module: Warbler CLI Library
// Description: Shared helpers for the Warbler command-line interface.
// Purpose: Keep bind policy and logging bootstrap testable outside the binary.
// Dependencies: tracing-subscriber, warbler-config
// ============================================================================

//! ## Overview
//! The `warbler` binary (`src/main.rs`) dispatches commands; this library
//! holds the pieces it shares with tests: the network exposure policy for
//! `serve` and the `tracing` subscriber setup.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod logging;
pub mod serve_policy;
