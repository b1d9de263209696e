// crates/warbler-cli/src/logging.rs
// ============================================================================
// Module: Logging Bootstrap
// Description: `tracing` subscriber setup from logging configuration.
// Purpose: Route server events to stderr as pretty text or JSON lines.
// Dependencies: tracing-subscriber, warbler-config
// ============================================================================

//! ## Overview
//! `RUST_LOG` takes precedence over `logging.filter` when set. Events always
//! go to stderr so command output on stdout stays machine-readable.

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use warbler_config::LogFormat;
use warbler_config::LoggingConfig;

/// Logging setup failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directive did not parse.
    #[error("invalid log filter '{filter}': {error}")]
    Filter {
        /// Raw directive.
        filter: String,
        /// Parser message.
        error: String,
    },
    /// A global subscriber was already installed.
    #[error("logging already initialized: {0}")]
    Install(String),
}

/// Builds the filter from `RUST_LOG`, falling back to the configured directive.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] when the configured directive is invalid.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter).map_err(|err| LoggingError::Filter {
        filter: config.filter.clone(),
        error: err.to_string(),
    })
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingError`] when the filter is invalid or a subscriber is
/// already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init(),
    };
    installed.map_err(|err| LoggingError::Install(err.to_string()))
}
