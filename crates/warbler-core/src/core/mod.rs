// crates/warbler-core/src/core/mod.rs
// ============================================================================
// Module: Warbler Core Types
// Description: Identifiers, timestamps, and domain records.
// Purpose: Group the plain data types that flow between crates.
// Dependencies: serde, time
// ============================================================================

pub mod identifiers;
pub mod records;
pub mod time;
