// crates/warbler-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Warbler Store
// Description: Durable WarblerStore backed by SQLite.
// Purpose: Persist the social graph with relational integrity.
// Dependencies: rusqlite, serde, thiserror, warbler-core
// ============================================================================

//! ## Overview
//! This module implements [`WarblerStore`] on top of `SQLite`. Uniqueness and
//! cascading deletes are expressed as table constraints, so the database is
//! the source of truth for integrity; constraint failures are translated into
//! [`StoreError`] variants (`UNIQUE` and the blank-identity `CHECK` →
//! `Conflict`, `FOREIGN KEY` → `NotFound`, other `CHECK`s → `Invalid`).
//! User search folds case with Rust's Unicode lowercase, registered on the
//! connection as `warbler_lower`.
//! Security posture: database contents are untrusted; decoded identifiers are
//! re-validated before they reach callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::ErrorCode;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::functions::FunctionFlags;
use rusqlite::params;
use serde::Deserialize;
use thiserror::Error;
use warbler_core::DEFAULT_HEADER_IMAGE_URL;
use warbler_core::DEFAULT_IMAGE_URL;
use warbler_core::FeedItem;
use warbler_core::Message;
use warbler_core::MessageId;
use warbler_core::NewMessage;
use warbler_core::NewUser;
use warbler_core::ProfileUpdate;
use warbler_core::StoreError;
use warbler_core::Timestamp;
use warbler_core::User;
use warbler_core::UserId;
use warbler_core::UserStats;
use warbler_core::WarblerStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
pub const SCHEMA_VERSION: i64 = 1;

/// Name of the `CHECK` that keeps usernames and emails non-blank.
const USER_IDENTITY_CHECK: &str = "users_identity_not_blank";

/// SQL name of the Unicode lowercase function.
const LOWER_FUNCTION: &str = "warbler_lower";
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default database file name.
const DEFAULT_DB_FILE: &str = "warbler.db";

/// Column list used by every user query.
const USER_COLUMNS: &str =
    "users.id, users.username, users.email, users.image_url, users.header_image_url, users.bio, \
     users.location, users.password";
/// Column list used by every feed query.
const FEED_COLUMNS: &str = "messages.id, messages.text, messages.timestamp, messages.user_id, \
                            users.username, users.image_url";

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    #[serde(default = "default_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Returns a config for `path` with default tuning.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl Default for SqliteStoreConfig {
    fn default() -> Self {
        Self::for_path(default_path())
    }
}

/// Returns the default database path.
fn default_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_FILE)
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding password hashes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Unique constraint violation.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
    /// Foreign key target missing.
    #[error("sqlite store missing reference: {0}")]
    MissingReference(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data or request.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Db(message),
            SqliteStoreError::Conflict(message) => Self::Conflict(message),
            SqliteStoreError::MissingReference(message) => Self::NotFound(message),
            SqliteStoreError::VersionMismatch(message) => Self::VersionMismatch(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

impl From<rusqlite::Error> for SqliteStoreError {
    fn from(error: rusqlite::Error) -> Self {
        let message = error.to_string();
        let rusqlite::Error::SqliteFailure(failure, _) = &error else {
            return Self::Db(message);
        };
        if failure.code != ErrorCode::ConstraintViolation {
            return Self::Db(message);
        }
        match failure.extended_code {
            rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                Self::Conflict(message)
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Self::MissingReference(message),
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK if message.contains(USER_IDENTITY_CHECK) => {
                Self::Conflict(message)
            }
            rusqlite::ffi::SQLITE_CONSTRAINT_CHECK | rusqlite::ffi::SQLITE_CONSTRAINT_NOTNULL => {
                Self::Invalid(message)
            }
            _ => Self::Db(message),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed Warbler store.
///
/// # Invariants
/// - `SQLite` connection access is serialized through a mutex.
/// - Foreign keys are enforced on every connection.
#[derive(Clone)]
pub struct SqliteWarblerStore {
    /// Store configuration.
    config: SqliteStoreConfig,
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteWarblerStore {
    /// Opens (and if necessary creates) an `SQLite`-backed store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(&config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            config,
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Drops every table and recreates an empty schema.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the schema cannot be rebuilt.
    pub fn reset(&self) -> Result<(), SqliteStoreError> {
        let mut guard = self.lock()?;
        guard.execute_batch(
            "DROP TABLE IF EXISTS likes;
             DROP TABLE IF EXISTS follows;
             DROP TABLE IF EXISTS messages;
             DROP TABLE IF EXISTS users;
             DROP TABLE IF EXISTS store_meta;",
        )?;
        initialize_schema(&mut guard)
    }

    /// Locks the shared connection.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Io("sqlite mutex poisoned".to_string()))
    }

    /// Loads a single user by a `WHERE` clause with one parameter.
    fn query_user(
        &self,
        clause: &str,
        param: &dyn rusqlite::ToSql,
    ) -> Result<Option<User>, SqliteStoreError> {
        let guard = self.lock()?;
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {clause}");
        Ok(guard.query_row(&sql, [param], map_user_row).optional()?)
    }

    /// Loads users joined through the follows table.
    fn query_follow_users(
        &self,
        join_column: &str,
        filter_column: &str,
        user: UserId,
    ) -> Result<Vec<User>, SqliteStoreError> {
        let guard = self.lock()?;
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM follows JOIN users ON users.id = follows.{join_column} \
             WHERE follows.{filter_column} = ?1 ORDER BY users.id"
        );
        let mut statement = guard.prepare(&sql)?;
        let rows = statement.query_map(params![user.to_row()], map_user_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Loads feed items for a `WHERE` clause with a user parameter and limit.
    fn query_feed(
        &self,
        join: &str,
        clause: &str,
        user: UserId,
        limit: usize,
    ) -> Result<Vec<FeedItem>, SqliteStoreError> {
        let guard = self.lock()?;
        let sql = format!(
            "SELECT {FEED_COLUMNS} FROM messages JOIN users ON users.id = messages.user_id {join} \
             WHERE {clause} ORDER BY messages.timestamp DESC, messages.id DESC LIMIT ?2"
        );
        let mut statement = guard.prepare(&sql)?;
        let rows = statement.query_map(params![user.to_row(), limit_param(limit)], map_feed_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl WarblerStore for SqliteWarblerStore {
    fn create_user(&self, user: &NewUser) -> Result<User, StoreError> {
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO users (username, email, image_url, password) VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.username,
                    user.email,
                    user.image_url.as_deref().unwrap_or(DEFAULT_IMAGE_URL),
                    user.password_hash
                ],
            )
            .map_err(SqliteStoreError::from)?;
        let id = UserId::from_row(guard.last_insert_rowid())
            .ok_or_else(|| SqliteStoreError::Invalid("non-positive user id".to_string()))?;
        drop(guard);
        self.user(id)?.ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.query_user("users.id = ?1", &id.to_row())?)
    }

    fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(self.query_user("users.username = ?1", &username)?)
    }

    fn list_users(&self, search: Option<&str>) -> Result<Vec<User>, StoreError> {
        let guard = self.lock()?;
        let users = match search {
            Some(term) => {
                let sql = format!(
                    "SELECT {USER_COLUMNS} FROM users \
                     WHERE instr({LOWER_FUNCTION}(users.username), ?1) > 0 ORDER BY users.id"
                );
                let mut statement = guard.prepare(&sql).map_err(SqliteStoreError::from)?;
                let rows = statement
                    .query_map(params![term.to_lowercase()], map_user_row)
                    .map_err(SqliteStoreError::from)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(SqliteStoreError::from)?
            }
            None => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY users.id");
                let mut statement = guard.prepare(&sql).map_err(SqliteStoreError::from)?;
                let rows =
                    statement.query_map([], map_user_row).map_err(SqliteStoreError::from)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(SqliteStoreError::from)?
            }
        };
        Ok(users)
    }

    fn update_user(&self, id: UserId, update: &ProfileUpdate) -> Result<User, StoreError> {
        let update = update.clone().normalized();
        let changed = self
            .lock()?
            .execute(
                "UPDATE users SET username = ?1, email = ?2, image_url = ?3, header_image_url = \
                 ?4, bio = ?5, location = ?6 WHERE id = ?7",
                params![
                    update.username,
                    update.email,
                    update.image_url,
                    update.header_image_url,
                    update.bio,
                    update.location,
                    id.to_row()
                ],
            )
            .map_err(SqliteStoreError::from)?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("user {id}")));
        }
        self.user(id)?.ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    fn delete_user(&self, id: UserId) -> Result<bool, StoreError> {
        let changed = self
            .lock()?
            .execute("DELETE FROM users WHERE id = ?1", params![id.to_row()])
            .map_err(SqliteStoreError::from)?;
        Ok(changed > 0)
    }

    fn user_stats(&self, id: UserId) -> Result<UserStats, StoreError> {
        let guard = self.lock()?;
        let counts = guard
            .query_row(
                "SELECT
                    (SELECT COUNT(1) FROM messages WHERE user_id = ?1),
                    (SELECT COUNT(1) FROM follows WHERE user_following_id = ?1),
                    (SELECT COUNT(1) FROM follows WHERE user_being_followed_id = ?1),
                    (SELECT COUNT(1) FROM likes WHERE user_id = ?1)",
                params![id.to_row()],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .map_err(SqliteStoreError::from)?;
        Ok(UserStats {
            messages: count_to_u64(counts.0),
            following: count_to_u64(counts.1),
            followers: count_to_u64(counts.2),
            likes: count_to_u64(counts.3),
        })
    }

    fn follow(&self, follower: UserId, followed: UserId) -> Result<(), StoreError> {
        if follower == followed {
            return Err(StoreError::Invalid("users cannot follow themselves".to_string()));
        }
        self.lock()?
            .execute(
                "INSERT INTO follows (user_being_followed_id, user_following_id) VALUES (?1, ?2)
                 ON CONFLICT DO NOTHING",
                params![followed.to_row(), follower.to_row()],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn unfollow(&self, follower: UserId, followed: UserId) -> Result<bool, StoreError> {
        let changed = self
            .lock()?
            .execute(
                "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
                params![followed.to_row(), follower.to_row()],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(changed > 0)
    }

    fn following(&self, user: UserId) -> Result<Vec<User>, StoreError> {
        Ok(self.query_follow_users("user_being_followed_id", "user_following_id", user)?)
    }

    fn followers(&self, user: UserId) -> Result<Vec<User>, StoreError> {
        Ok(self.query_follow_users("user_following_id", "user_being_followed_id", user)?)
    }

    fn is_following(&self, follower: UserId, followed: UserId) -> Result<bool, StoreError> {
        let found = self
            .lock()?
            .query_row(
                "SELECT 1 FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = \
                 ?2",
                params![followed.to_row(), follower.to_row()],
                |_| Ok(()),
            )
            .optional()
            .map_err(SqliteStoreError::from)?;
        Ok(found.is_some())
    }

    fn create_message(&self, message: &NewMessage) -> Result<Message, StoreError> {
        let timestamp = Timestamp::now();
        let guard = self.lock()?;
        guard
            .execute(
                "INSERT INTO messages (text, timestamp, user_id) VALUES (?1, ?2, ?3)",
                params![message.text, timestamp.as_unix_millis(), message.user_id.to_row()],
            )
            .map_err(SqliteStoreError::from)?;
        let id = MessageId::from_row(guard.last_insert_rowid())
            .ok_or_else(|| SqliteStoreError::Invalid("non-positive message id".to_string()))?;
        Ok(Message {
            id,
            text: message.text.clone(),
            timestamp,
            user_id: message.user_id,
        })
    }

    fn message(&self, id: MessageId) -> Result<Option<Message>, StoreError> {
        let message = self
            .lock()?
            .query_row(
                "SELECT id, text, timestamp, user_id FROM messages WHERE id = ?1",
                params![id.to_row()],
                map_message_row,
            )
            .optional()
            .map_err(SqliteStoreError::from)?;
        Ok(message)
    }

    fn delete_message(&self, id: MessageId) -> Result<bool, StoreError> {
        let changed = self
            .lock()?
            .execute("DELETE FROM messages WHERE id = ?1", params![id.to_row()])
            .map_err(SqliteStoreError::from)?;
        Ok(changed > 0)
    }

    fn messages_by_user(&self, user: UserId, limit: usize) -> Result<Vec<Message>, StoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare(
                "SELECT id, text, timestamp, user_id FROM messages WHERE user_id = ?1
                 ORDER BY timestamp DESC, id DESC LIMIT ?2",
            )
            .map_err(SqliteStoreError::from)?;
        let rows = statement
            .query_map(params![user.to_row(), limit_param(limit)], map_message_row)
            .map_err(SqliteStoreError::from)?;
        Ok(rows.collect::<Result<Vec<_>, _>>().map_err(SqliteStoreError::from)?)
    }

    fn timeline(&self, viewer: UserId, limit: usize) -> Result<Vec<FeedItem>, StoreError> {
        Ok(self.query_feed(
            "",
            "messages.user_id = ?1 OR messages.user_id IN (SELECT user_being_followed_id FROM \
             follows WHERE user_following_id = ?1)",
            viewer,
            limit,
        )?)
    }

    fn like(&self, user: UserId, message: MessageId) -> Result<(), StoreError> {
        self.lock()?
            .execute(
                "INSERT INTO likes (user_id, message_id) VALUES (?1, ?2)
                 ON CONFLICT (user_id, message_id) DO NOTHING",
                params![user.to_row(), message.to_row()],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }

    fn unlike(&self, user: UserId, message: MessageId) -> Result<bool, StoreError> {
        let changed = self
            .lock()?
            .execute(
                "DELETE FROM likes WHERE user_id = ?1 AND message_id = ?2",
                params![user.to_row(), message.to_row()],
            )
            .map_err(SqliteStoreError::from)?;
        Ok(changed > 0)
    }

    fn has_liked(&self, user: UserId, message: MessageId) -> Result<bool, StoreError> {
        let found = self
            .lock()?
            .query_row(
                "SELECT 1 FROM likes WHERE user_id = ?1 AND message_id = ?2",
                params![user.to_row(), message.to_row()],
                |_| Ok(()),
            )
            .optional()
            .map_err(SqliteStoreError::from)?;
        Ok(found.is_some())
    }

    fn liked_message_ids(&self, user: UserId) -> Result<Vec<MessageId>, StoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare("SELECT message_id FROM likes WHERE user_id = ?1 ORDER BY message_id")
            .map_err(SqliteStoreError::from)?;
        let rows = statement
            .query_map(params![user.to_row()], |row| message_id_column(row, 0))
            .map_err(SqliteStoreError::from)?;
        Ok(rows.collect::<Result<Vec<_>, _>>().map_err(SqliteStoreError::from)?)
    }

    fn liked_messages(&self, user: UserId, limit: usize) -> Result<Vec<FeedItem>, StoreError> {
        Ok(self.query_feed(
            "JOIN likes ON likes.message_id = messages.id",
            "likes.user_id = ?1",
            user,
            limit,
        )?)
    }

    fn likes_for_message(&self, message: MessageId) -> Result<Vec<UserId>, StoreError> {
        let guard = self.lock()?;
        let mut statement = guard
            .prepare("SELECT user_id FROM likes WHERE message_id = ?1 ORDER BY user_id")
            .map_err(SqliteStoreError::from)?;
        let rows = statement
            .query_map(params![message.to_row()], |row| user_id_column(row, 0))
            .map_err(SqliteStoreError::from)?;
        Ok(rows.collect::<Result<Vec<_>, _>>().map_err(SqliteStoreError::from)?)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        self.lock()?
            .query_row("SELECT 1", [], |_| Ok(()))
            .map_err(SqliteStoreError::from)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Reads a user identifier column.
fn user_id_column(row: &Row<'_>, index: usize) -> rusqlite::Result<UserId> {
    let raw: i64 = row.get(index)?;
    UserId::from_row(raw).ok_or(rusqlite::Error::IntegralValueOutOfRange(index, raw))
}

/// Reads a message identifier column.
fn message_id_column(row: &Row<'_>, index: usize) -> rusqlite::Result<MessageId> {
    let raw: i64 = row.get(index)?;
    MessageId::from_row(raw).ok_or(rusqlite::Error::IntegralValueOutOfRange(index, raw))
}

/// Maps a row selected with [`USER_COLUMNS`].
fn map_user_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: user_id_column(row, 0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        image_url: row.get(3)?,
        header_image_url: row.get(4)?,
        bio: row.get(5)?,
        location: row.get(6)?,
        password_hash: row.get(7)?,
    })
}

/// Maps a `(id, text, timestamp, user_id)` message row.
fn map_message_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: message_id_column(row, 0)?,
        text: row.get(1)?,
        timestamp: Timestamp::from_unix_millis(row.get(2)?),
        user_id: user_id_column(row, 3)?,
    })
}

/// Maps a row selected with [`FEED_COLUMNS`].
fn map_feed_row(row: &Row<'_>) -> rusqlite::Result<FeedItem> {
    Ok(FeedItem {
        message: map_message_row(row)?,
        author_username: row.get(4)?,
        author_image_url: row.get(5)?,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with secure defaults.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags)?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies `SQLite` pragmas required for integrity and durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))?;
    connection.busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))?;
    connection.create_scalar_function(
        LOWER_FUNCTION,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |context| Ok(context.get::<String>(0)?.to_lowercase()),
    )?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction()?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])?;
            tx.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    email TEXT NOT NULL UNIQUE,
                    username TEXT NOT NULL UNIQUE,
                    image_url TEXT NOT NULL DEFAULT '{DEFAULT_IMAGE_URL}',
                    header_image_url TEXT NOT NULL DEFAULT '{DEFAULT_HEADER_IMAGE_URL}',
                    bio TEXT,
                    location TEXT,
                    password TEXT NOT NULL,
                    CONSTRAINT {USER_IDENTITY_CHECK}
                        CHECK (length(trim(username)) > 0 AND length(trim(email)) > 0)
                );
                CREATE TABLE IF NOT EXISTS messages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    text TEXT NOT NULL CHECK (length(text) <= 140),
                    timestamp INTEGER NOT NULL,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE
                );
                CREATE INDEX IF NOT EXISTS idx_messages_user_timestamp
                    ON messages (user_id, timestamp);
                CREATE TABLE IF NOT EXISTS follows (
                    user_being_followed_id INTEGER NOT NULL
                        REFERENCES users(id) ON DELETE CASCADE,
                    user_following_id INTEGER NOT NULL
                        REFERENCES users(id) ON DELETE CASCADE,
                    PRIMARY KEY (user_being_followed_id, user_following_id),
                    CHECK (user_being_followed_id <> user_following_id)
                );
                CREATE INDEX IF NOT EXISTS idx_follows_following
                    ON follows (user_following_id);
                CREATE TABLE IF NOT EXISTS likes (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    message_id INTEGER NOT NULL REFERENCES messages(id) ON DELETE CASCADE,
                    UNIQUE (user_id, message_id)
                );
                CREATE INDEX IF NOT EXISTS idx_likes_message ON likes (message_id);"
            ))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit()?;
    Ok(())
}

/// Converts a query limit into an `SQLite` integer.
fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Converts a `COUNT` result into `u64`.
fn count_to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}
