// crates/warbler-config/src/config.rs
// ============================================================================
// Module: Warbler Configuration
// Description: Configuration loading and validation for the Warbler server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: rand, serde, toml, warbler-store-sqlite
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and falls back to local-development defaults.
//! Two environment variables override file values after parsing:
//! `WARBLER_DATABASE_PATH` (store path) and `WARBLER_SECRET_KEY` (session
//! signing key).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use rand::RngCore;
use serde::Deserialize;
use thiserror::Error;
use warbler_store_sqlite::SqliteStoreConfig;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "warbler.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "WARBLER_CONFIG";
/// Environment variable overriding the database path.
pub const DATABASE_PATH_ENV_VAR: &str = "WARBLER_DATABASE_PATH";
/// Environment variable overriding the session secret key.
pub const SECRET_KEY_ENV_VAR: &str = "WARBLER_SECRET_KEY";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Minimum session secret length in bytes.
pub const MIN_SECRET_KEY_BYTES: usize = 32;
/// Number of random bytes in a generated secret.
const GENERATED_SECRET_BYTES: usize = 32;
/// Maximum session cookie name length.
const MAX_COOKIE_NAME_LENGTH: usize = 64;
/// Upper bound for feed and profile list limits.
const MAX_LIST_LIMIT: usize = 1_000;
/// Default bind address.
const DEFAULT_BIND: &str = "127.0.0.1:5000";
/// Default session cookie name.
const DEFAULT_COOKIE_NAME: &str = "warbler_session";
/// Default number of messages on the home timeline.
const DEFAULT_TIMELINE_LIMIT: usize = 100;
/// Default number of messages on a profile page.
const DEFAULT_PROFILE_MESSAGES_LIMIT: usize = 100;
/// Default tracing filter directive.
const DEFAULT_LOG_FILTER: &str = "info";

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Warbler server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WarblerConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// `SQLite` store configuration.
    #[serde(default)]
    pub store: SqliteStoreConfig,
    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,
    /// Application behavior limits.
    #[serde(default)]
    pub app: AppConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl WarblerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path comes from `path`, then `WARBLER_CONFIG`, then
    /// `warbler.toml` in the working directory. Only the last of these may be
    /// absent, in which case defaults are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, required) = resolve_path(path)?;
        validate_path(&resolved)?;
        let mut config = if !required && !resolved.exists() {
            Self::default()
        } else {
            let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
            Self::from_bytes(&bytes)?
        };
        config.apply_overrides(|key| env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from raw file bytes without validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the payload is oversized, not UTF-8, or
    /// not valid TOML.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Applies environment overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATABASE_PATH_ENV_VAR).filter(|value| !value.trim().is_empty())
        {
            self.store.path = PathBuf::from(path);
        }
        if let Some(secret) = lookup(SECRET_KEY_ENV_VAR).filter(|value| !value.is_empty()) {
            self.session.secret_key = Some(secret);
            self.session.secret_generated = false;
        }
    }

    /// Validates the configuration for internal consistency.
    ///
    /// A missing session secret is replaced with a random per-process key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.server.validate()?;
        validate_store(&self.store)?;
        self.session.validate()?;
        self.app.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind_addr()
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Optional directory served under `/static`.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: None,
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid("invalid bind address".to_string()))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if let Some(dir) = &self.static_dir {
            validate_path_string("server.static_dir", &dir.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Session cookie configuration.
///
/// # Invariants
/// - After [`WarblerConfig::validate`], `secret_key` is set and at least
///   [`MIN_SECRET_KEY_BYTES`] long.
#[derive(Clone, Deserialize)]
pub struct SessionConfig {
    /// HMAC key used to sign session cookies.
    #[serde(default)]
    pub secret_key: Option<String>,
    /// Name of the session cookie.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Sets the `Secure` attribute on the session cookie.
    #[serde(default)]
    pub secure_cookie: bool,
    /// Requires a CSRF token on form submissions.
    #[serde(default = "default_true")]
    pub csrf_enabled: bool,
    /// True when `secret_key` was generated at startup.
    #[serde(skip)]
    pub secret_generated: bool,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("cookie_name", &self.cookie_name)
            .field("secure_cookie", &self.secure_cookie)
            .field("csrf_enabled", &self.csrf_enabled)
            .field("secret_generated", &self.secret_generated)
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            cookie_name: default_cookie_name(),
            secure_cookie: false,
            csrf_enabled: true,
            secret_generated: false,
        }
    }
}

impl SessionConfig {
    /// Returns the signing key bytes, empty when unset.
    #[must_use]
    pub fn secret_bytes(&self) -> &[u8] {
        self.secret_key.as_deref().map_or(&[], str::as_bytes)
    }

    /// Validates session configuration, generating a secret when absent.
    fn validate(&mut self) -> Result<(), ConfigError> {
        if self.secret_key.is_none() {
            self.secret_key = Some(generate_secret());
            self.secret_generated = true;
        }
        if self.secret_bytes().len() < MIN_SECRET_KEY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "session.secret_key must be at least {MIN_SECRET_KEY_BYTES} bytes"
            )));
        }
        let name = self.cookie_name.as_str();
        if name.is_empty() || name.len() > MAX_COOKIE_NAME_LENGTH {
            return Err(ConfigError::Invalid(
                "session.cookie_name must be 1-64 characters".to_string(),
            ));
        }
        if !name.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.')) {
            return Err(ConfigError::Invalid(
                "session.cookie_name must be a cookie token".to_string(),
            ));
        }
        Ok(())
    }
}

/// Application behavior limits.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Maximum messages shown on the home timeline.
    #[serde(default = "default_timeline_limit")]
    pub timeline_limit: usize,
    /// Maximum messages shown on a profile page.
    #[serde(default = "default_profile_messages_limit")]
    pub profile_messages_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            timeline_limit: DEFAULT_TIMELINE_LIMIT,
            profile_messages_limit: DEFAULT_PROFILE_MESSAGES_LIMIT,
        }
    }
}

impl AppConfig {
    /// Validates application limits.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("app.timeline_limit", self.timeline_limit),
            ("app.profile_messages_limit", self.profile_messages_limit),
        ] {
            if value == 0 || value > MAX_LIST_LIMIT {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be between 1 and {MAX_LIST_LIMIT}"
                )));
            }
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directive (`RUST_LOG` syntax).
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.filter.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.filter must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path and whether the file must exist.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates the `[store]` section.
fn validate_store(store: &SqliteStoreConfig) -> Result<(), ConfigError> {
    validate_path_string("store.path", &store.path.to_string_lossy())?;
    if store.busy_timeout_ms == 0 {
        return Err(ConfigError::Invalid(
            "store.busy_timeout_ms must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Generates a random hex-encoded session secret.
fn generate_secret() -> String {
    let mut bytes = [0_u8; GENERATED_SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Returns the default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Returns the default cookie name.
fn default_cookie_name() -> String {
    DEFAULT_COOKIE_NAME.to_string()
}

/// Returns the default log filter.
fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Returns `true` for serde defaults.
const fn default_true() -> bool {
    true
}

/// Returns the default timeline limit.
const fn default_timeline_limit() -> usize {
    DEFAULT_TIMELINE_LIMIT
}

/// Returns the default profile message limit.
const fn default_profile_messages_limit() -> usize {
    DEFAULT_PROFILE_MESSAGES_LIMIT
}

// ============================================================================
// SECTION: Tests
// ============================================================================
