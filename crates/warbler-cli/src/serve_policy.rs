// crates/warbler-cli/src/serve_policy.rs
// ============================================================================
// Module: Serve Policy
// Description: Network exposure checks for the `serve` command.
// Purpose: Keep the server on loopback unless exposure is explicitly allowed.
// Dependencies: thiserror, warbler-config
// ============================================================================

//! ## Overview
//! Binding to a non-loopback address needs an explicit opt-in, either the
//! `--allow-non-loopback` flag or [`ALLOW_NON_LOOPBACK_ENV`]. Exposed servers
//! without secure session cookies are allowed but reported so the caller can
//! warn.

use std::env;
use std::net::SocketAddr;

use thiserror::Error;
use warbler_config::WarblerConfig;

/// Environment variable enabling non-loopback server binds.
pub const ALLOW_NON_LOOPBACK_ENV: &str = "WARBLER_ALLOW_NON_LOOPBACK";

/// Result of checking the bind address against policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindOutcome {
    /// Address the server will bind.
    pub bind_addr: SocketAddr,
    /// True when the address is reachable from other hosts.
    pub network_exposed: bool,
    /// Whether session cookies carry the `Secure` attribute.
    pub secure_cookie: bool,
}

/// Serve policy failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServePolicyError {
    /// Environment variable was set to an unrecognized value.
    #[error("{ALLOW_NON_LOOPBACK_ENV} must be true/false, 1/0, yes/no, or on/off (got '{value}')")]
    InvalidEnv {
        /// Raw environment value.
        value: String,
    },
    /// Bind address failed to parse.
    #[error("invalid bind address '{bind}': {error}")]
    InvalidBind {
        /// Raw bind value.
        bind: String,
        /// Parse error message.
        error: String,
    },
    /// Non-loopback binding requires explicit opt-in.
    #[error(
        "refusing to bind non-loopback address {bind}; pass --allow-non-loopback or set \
         {ALLOW_NON_LOOPBACK_ENV}=1"
    )]
    NonLoopbackOptInRequired {
        /// Bind address.
        bind: String,
    },
}

/// Resolves the non-loopback opt-in from the CLI flag and environment.
///
/// # Errors
///
/// Returns [`ServePolicyError::InvalidEnv`] when the environment value is not
/// a recognized boolean.
pub fn resolve_allow_non_loopback(flag: bool) -> Result<bool, ServePolicyError> {
    if flag {
        return Ok(true);
    }
    let Some(value) = env::var_os(ALLOW_NON_LOOPBACK_ENV) else {
        return Ok(false);
    };
    parse_allow_non_loopback_value(&value.to_string_lossy())
}

/// Checks the configured bind address against the loopback policy.
///
/// # Errors
///
/// Returns [`ServePolicyError`] when the address is invalid or exposed
/// without opt-in.
pub fn enforce_local_only(
    config: &WarblerConfig,
    allow_non_loopback: bool,
) -> Result<BindOutcome, ServePolicyError> {
    let bind = config.server.bind.as_str();
    let addr: SocketAddr =
        bind.parse().map_err(|err: std::net::AddrParseError| ServePolicyError::InvalidBind {
            bind: bind.to_string(),
            error: err.to_string(),
        })?;
    let network_exposed = !addr.ip().is_loopback();
    if network_exposed && !allow_non_loopback {
        return Err(ServePolicyError::NonLoopbackOptInRequired {
            bind: bind.to_string(),
        });
    }
    Ok(BindOutcome {
        bind_addr: addr,
        network_exposed,
        secure_cookie: config.session.secure_cookie,
    })
}

/// Parses a bool-ish string (true/false/1/0/yes/no/on/off).
fn parse_boolish(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Parses an env value for allow-non-loopback.
fn parse_allow_non_loopback_value(value: &str) -> Result<bool, ServePolicyError> {
    parse_boolish(value).ok_or_else(|| ServePolicyError::InvalidEnv {
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::expect_used,
        reason = "Test helpers use expect/expect_err for concise failure messages."
    )]

    use warbler_config::WarblerConfig;

    use super::ServePolicyError;
    use super::enforce_local_only;
    use super::parse_allow_non_loopback_value;

    fn config_with_bind(bind: &str) -> WarblerConfig {
        let mut config = WarblerConfig::default();
        config.server.bind = bind.to_string();
        config
    }

    #[test]
    fn loopback_binds_are_allowed() {
        let outcome = enforce_local_only(&config_with_bind("127.0.0.1:5000"), false)
            .expect("loopback bind");
        assert!(!outcome.network_exposed);
        let outcome =
            enforce_local_only(&config_with_bind("[::1]:5000"), false).expect("ipv6 loopback");
        assert!(!outcome.network_exposed);
    }

    #[test]
    fn non_loopback_requires_opt_in() {
        let err = enforce_local_only(&config_with_bind("0.0.0.0:5000"), false)
            .expect_err("expected opt-in error");
        assert!(matches!(err, ServePolicyError::NonLoopbackOptInRequired { .. }));
    }

    #[test]
    fn non_loopback_with_opt_in_reports_exposure() {
        let mut config = config_with_bind("0.0.0.0:5000");
        config.session.secure_cookie = true;
        let outcome = enforce_local_only(&config, true).expect("opted in");
        assert!(outcome.network_exposed);
        assert!(outcome.secure_cookie);
    }

    #[test]
    fn malformed_bind_is_rejected() {
        let err = enforce_local_only(&config_with_bind("localhost"), true)
            .expect_err("expected bind error");
        assert!(matches!(err, ServePolicyError::InvalidBind { .. }));
    }

    #[test]
    fn env_values_parse_as_booleans() {
        assert_eq!(parse_allow_non_loopback_value(" YES "), Ok(true));
        assert_eq!(parse_allow_non_loopback_value("0"), Ok(false));
        assert!(matches!(
            parse_allow_non_loopback_value("maybe"),
            Err(ServePolicyError::InvalidEnv { .. })
        ));
    }
}
