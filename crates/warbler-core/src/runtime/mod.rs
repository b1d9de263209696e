// crates/warbler-core/src/runtime/mod.rs
// ============================================================================
// Module: Warbler Runtime Helpers
// Description: In-process implementations of core interfaces.
// Purpose: Provide a dependency-free store for tests and embedding.
// Dependencies: std
// ============================================================================

pub mod store;

pub use store::InMemoryWarblerStore;
