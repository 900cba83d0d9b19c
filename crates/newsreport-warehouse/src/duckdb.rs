//! `DuckDB` session scope.
//!
//! A [`Session`] owns exactly one connection and closes it when dropped, so a
//! connection never outlives the scope that opened it.

use std::ops::Deref;
use std::path::{Path, PathBuf};

use ::duckdb::{AccessMode as DuckAccessMode, Config, Connection};
use tracing::{debug, warn};

/// Access mode for database sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read-only access, used by the report queries. The engine rejects
    /// writes, and opening a missing database file fails instead of creating it.
    ReadOnly,
    /// Read-write access, used by provisioning and loading.
    ReadWrite,
}

/// Opens one session per call against a single database file.
///
/// There is no pooling and no retry: each call opens a fresh connection and
/// an open failure is returned to the caller as-is.
#[derive(Debug, Clone)]
pub struct SessionManager {
    db_path: PathBuf,
}

impl SessionManager {
    /// Create a session manager for the database file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: path.into(),
        }
    }

    /// Open a new session.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The database file cannot be opened
    /// - Connection configuration fails
    pub fn open(&self, mode: AccessMode) -> Result<Session, ::duckdb::Error> {
        let connection = open_connection(self.db_path.as_path(), mode)?;
        debug!(path = %self.db_path.display(), ?mode, "session opened");
        Ok(Session {
            mode,
            connection: Some(connection),
        })
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }
}

/// A single open connection that is closed when dropped.
pub struct Session {
    mode: AccessMode,
    connection: Option<Connection>,
}

impl Session {
    /// Access mode this session was opened with.
    #[must_use]
    pub fn mode(&self) -> AccessMode {
        self.mode
    }
}

impl Deref for Session {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("session connection unexpectedly missing")
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        match connection.close() {
            Ok(()) => debug!(mode = ?self.mode, "session closed"),
            // The handle returned alongside the error is dropped here, which
            // releases it regardless.
            Err((_, error)) => warn!(mode = ?self.mode, %error, "session close failed"),
        }
    }
}

/// Open a new database connection.
///
/// # Errors
/// Returns an error if the database file cannot be opened or configured.
fn open_connection(path: &Path, mode: AccessMode) -> Result<Connection, ::duckdb::Error> {
    let connection = match mode {
        AccessMode::ReadOnly => Connection::open_with_flags(
            path,
            Config::default().access_mode(DuckAccessMode::ReadOnly)?,
        )?,
        AccessMode::ReadWrite => Connection::open(path)?,
    };
    configure_connection(&connection)?;
    Ok(connection)
}

/// Configure a database connection with appropriate settings.
///
/// # Errors
/// Returns an error if configuration SQL fails to execute.
fn configure_connection(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch("PRAGMA disable_progress_bar;")
}
