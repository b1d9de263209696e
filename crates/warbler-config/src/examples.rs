// crates/warbler-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and `check-config` tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for Warbler configuration. The output parses and
//! validates with [`crate::WarblerConfig`].

/// Returns a canonical example `warbler.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:5000"
static_dir = "static"

[store]
path = "warbler.db"
journal_mode = "wal"
sync_mode = "full"
busy_timeout_ms = 5000

[session]
# secret_key = "replace-with-at-least-32-bytes-of-random-text"
cookie_name = "warbler_session"
secure_cookie = false
csrf_enabled = true

[app]
timeline_limit = 100
profile_messages_limit = 100

[logging]
filter = "info,warbler_web=debug"
format = "pretty"
"#,
    )
}
