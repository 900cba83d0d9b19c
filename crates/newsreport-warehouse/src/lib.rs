//! # Newsreport Warehouse
//!
//! DuckDB-backed access to the `news` database for the newsreport CLI.
//!
//! ## Overview
//!
//! Every operation opens its own session, runs to completion, and closes the
//! session before returning. Nothing holds a connection between calls.
//!
//! ### Features
//!
//! - **Scoped sessions**: connections are closed on every exit path
//! - **View provisioning**: the `daily_status_log` aggregate view
//! - **Report queries**: popular articles, popular authors, error-rate days
//! - **Parameterized SQL**: caller values are bound, never interpolated
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use newsreport_warehouse::NewsDatabase;
//!
//! fn main() -> Result<(), newsreport_warehouse::WarehouseError> {
//!     let news = NewsDatabase::open_default();
//!
//!     for record in news.fetch_most_popular_articles(3)? {
//!         println!("\"{}\" -- {} views", record.title, record.hits);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Tables
//!
//! | Table | Description |
//! |-------|-------------|
//! | `authors` | Author names keyed by id |
//! | `articles` | Articles with their author and URL slug |
//! | `log` | One row per served request |
//!
//! ## Views
//!
//! | View | Description |
//! |------|-------------|
//! | `daily_status_log` | Hit counts per calendar day and status |

pub mod duckdb;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod views;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use ::duckdb::{Connection, ToSql};
use thiserror::Error;
use tracing::{debug, info, warn};

pub use duckdb::{AccessMode, Session, SessionManager};
pub use models::{
    ArticleHitRecord, ArticleRecord, AuthorRecord, AuthorViewRecord, DailyStatusRecord,
    ErrorRateRecord, LogEntry,
};

/// File name of the `news` database.
pub const NEWS_DB_FILE: &str = "news.duckdb";

/// Errors that can occur during warehouse operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (file system operations).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Query was rejected due to invalid parameters.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// A result row broke a data-model invariant.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

/// Configuration for the news database.
#[derive(Debug, Clone)]
pub struct NewsDbConfig {
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
}

impl Default for NewsDbConfig {
    fn default() -> Self {
        Self {
            db_path: resolve_db_path(),
        }
    }
}

/// Outcome of a view provisioning attempt that reached the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewProvisioning {
    /// The view was created.
    Created,
    /// The database refused the statement, typically because the view
    /// already exists. Carries the database message.
    Rejected(String),
}

/// The news database.
#[derive(Debug, Clone)]
pub struct NewsDatabase {
    sessions: SessionManager,
}

impl NewsDatabase {
    /// Use the database at the default location.
    #[must_use]
    pub fn open_default() -> Self {
        Self::open(NewsDbConfig::default())
    }

    /// Use the database described by `config`. No session is opened yet.
    #[must_use]
    pub fn open(config: NewsDbConfig) -> Self {
        Self {
            sessions: SessionManager::new(config.db_path),
        }
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        self.sessions.db_path()
    }

    /// Run `body` inside a fresh session.
    ///
    /// The session is closed when this returns, whether `body` succeeded,
    /// failed, or panicked.
    ///
    /// # Errors
    /// Returns an error if the session cannot be opened, or whatever `body`
    /// returns.
    pub fn with_session<T, F>(&self, mode: AccessMode, body: F) -> Result<T, WarehouseError>
    where
        F: FnOnce(&Connection) -> Result<T, WarehouseError>,
    {
        let session = self.sessions.open(mode)?;
        body(&session)
    }

    /// Create the `daily_status_log` view.
    ///
    /// A database-side failure (view already present, `log` missing) is
    /// logged and reported as [`ViewProvisioning::Rejected`]; only a session
    /// failure is returned as an error.
    pub fn create_daily_status_log_view(&self) -> Result<ViewProvisioning, WarehouseError> {
        self.with_session(AccessMode::ReadWrite, |connection| {
            match views::create_daily_status_log_view(connection) {
                Ok(()) => {
                    info!(view = views::DAILY_STATUS_LOG, "view created");
                    Ok(ViewProvisioning::Created)
                }
                Err(error) => {
                    warn!(view = views::DAILY_STATUS_LOG, %error, "view creation rejected");
                    Ok(ViewProvisioning::Rejected(error.to_string()))
                }
            }
        })
    }

    /// The `limit` most viewed articles, most hits first.
    pub fn fetch_most_popular_articles(
        &self,
        limit: usize,
    ) -> Result<Vec<ArticleHitRecord>, WarehouseError> {
        self.with_session(AccessMode::ReadOnly, |connection| {
            queries::most_popular_articles(connection, limit)
        })
    }

    /// Every author with at least one hit, most views first.
    pub fn fetch_authors_by_popularity(&self) -> Result<Vec<AuthorViewRecord>, WarehouseError> {
        self.with_session(AccessMode::ReadOnly, queries::authors_by_popularity)
    }

    /// Days whose not-found ratio is strictly above `cutoff`, oldest first.
    ///
    /// Requires the `daily_status_log` view.
    pub fn fetch_error_summary(&self, cutoff: f64) -> Result<Vec<ErrorRateRecord>, WarehouseError> {
        self.with_session(AccessMode::ReadOnly, |connection| {
            queries::error_summary(connection, cutoff)
        })
    }

    /// Raw contents of the `daily_status_log` view.
    pub fn fetch_daily_status_log(&self) -> Result<Vec<DailyStatusRecord>, WarehouseError> {
        self.with_session(AccessMode::ReadOnly, queries::daily_status_log)
    }

    /// Create the base tables if they are missing.
    pub fn initialize_schema(&self) -> Result<(), WarehouseError> {
        if let Some(parent) = self.db_path().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        self.with_session(AccessMode::ReadWrite, |connection| {
            migrations::apply_migrations(connection)?;
            Ok(())
        })
    }

    /// Insert authors in one transaction.
    pub fn load_authors(&self, rows: &[AuthorRecord]) -> Result<(), WarehouseError> {
        if rows.is_empty() {
            return Ok(());
        }

        self.with_session(AccessMode::ReadWrite, |connection| {
            connection.execute_batch("BEGIN TRANSACTION")?;
            let result = (|| -> Result<(), WarehouseError> {
                for row in rows {
                    let params: [&dyn ToSql; 3] = [&row.id, &row.name, &row.bio];
                    connection.execute(
                        "INSERT INTO authors (id, name, bio) VALUES (?, ?, ?)",
                        params.as_slice(),
                    )?;
                }
                Ok(())
            })();

            finalize_transaction(connection, result)?;
            debug!(rows = rows.len(), "authors loaded");
            Ok(())
        })
    }

    /// Insert articles in one transaction. Their authors must already exist.
    pub fn load_articles(&self, rows: &[ArticleRecord]) -> Result<(), WarehouseError> {
        if rows.is_empty() {
            return Ok(());
        }

        self.with_session(AccessMode::ReadWrite, |connection| {
            connection.execute_batch("BEGIN TRANSACTION")?;
            let result = (|| -> Result<(), WarehouseError> {
                for row in rows {
                    let params: [&dyn ToSql; 7] = [
                        &row.id,
                        &row.author,
                        &row.title,
                        &row.slug,
                        &row.lead,
                        &row.body,
                        &row.time,
                    ];
                    connection.execute(
                        "INSERT INTO articles (id, author, title, slug, lead, body, \"time\") \
                         VALUES (?, ?, ?, ?, ?, ?, CAST(? AS TIMESTAMP))",
                        params.as_slice(),
                    )?;
                }
                Ok(())
            })();

            finalize_transaction(connection, result)?;
            debug!(rows = rows.len(), "articles loaded");
            Ok(())
        })
    }

    /// Insert log entries in one transaction.
    pub fn load_log_entries(&self, rows: &[LogEntry]) -> Result<(), WarehouseError> {
        if rows.is_empty() {
            return Ok(());
        }

        self.with_session(AccessMode::ReadWrite, |connection| {
            connection.execute_batch("BEGIN TRANSACTION")?;
            let result = (|| -> Result<(), WarehouseError> {
                for row in rows {
                    let params: [&dyn ToSql; 5] =
                        [&row.path, &row.ip, &row.method, &row.status, &row.time];
                    connection.execute(
                        "INSERT INTO log (path, ip, method, status, \"time\") \
                         VALUES (?, ?, ?, ?, CAST(? AS TIMESTAMP))",
                        params.as_slice(),
                    )?;
                }
                Ok(())
            })();

            finalize_transaction(connection, result)?;
            debug!(rows = rows.len(), "log entries loaded");
            Ok(())
        })
    }
}

/// Finalize a transaction, committing on success or rolling back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

/// Resolve the database path from the environment.
fn resolve_db_path() -> PathBuf {
    if let Some(path) = non_empty_env("NEWS_DB_PATH") {
        return path;
    }

    if let Some(home) = non_empty_env("NEWS_HOME") {
        return home.join(NEWS_DB_FILE);
    }

    if let Some(home) = non_empty_env("HOME") {
        return home.join(".newsreport").join(NEWS_DB_FILE);
    }

    PathBuf::from(".newsreport").join(NEWS_DB_FILE)
}

fn non_empty_env(key: &str) -> Option<PathBuf> {
    let value = env::var_os(key)?;
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fresh_database(temp: &tempfile::TempDir) -> NewsDatabase {
        let news = NewsDatabase::open(NewsDbConfig {
            db_path: temp.path().join("data").join(NEWS_DB_FILE),
        });
        news.initialize_schema().expect("initialize schema");
        news
    }

    fn seed_one_article(news: &NewsDatabase) {
        news.load_authors(&[AuthorRecord {
            id: 1,
            name: "Ursula La Multa".to_string(),
            bio: None,
        }])
        .expect("load authors");
        news.load_articles(&[ArticleRecord {
            id: 1,
            author: 1,
            title: "My Title".to_string(),
            slug: "my-slug".to_string(),
            lead: None,
            body: None,
            time: "2016-08-15 18:55:10".to_string(),
        }])
        .expect("load articles");
    }

    #[test]
    fn initializes_base_tables_idempotently() {
        let temp = tempdir().expect("tempdir");
        let news = fresh_database(&temp);
        news.initialize_schema().expect("second initialize");

        let count: i64 = news
            .with_session(AccessMode::ReadOnly, |connection| {
                Ok(connection.query_row(
                    "SELECT COUNT(*) FROM information_schema.tables \
                     WHERE table_name IN ('authors', 'articles', 'log')",
                    [],
                    |row| row.get(0),
                )?)
            })
            .expect("count tables");
        assert_eq!(count, 3);

        let applied: i64 = news
            .with_session(AccessMode::ReadOnly, |connection| {
                Ok(connection.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                    row.get(0)
                })?)
            })
            .expect("count migrations");
        assert_eq!(applied, 2);
    }

    #[test]
    fn counts_hits_by_slug_substring() {
        let temp = tempdir().expect("tempdir");
        let news = fresh_database(&temp);
        seed_one_article(&news);

        let entries: Vec<LogEntry> = (0..5)
            .map(|second| {
                LogEntry::get(
                    "/article/my-slug",
                    "200 OK",
                    format!("2016-07-01 07:00:0{second}"),
                )
            })
            .chain(std::iter::once(LogEntry::get(
                "/",
                "200 OK",
                "2016-07-01 07:00:09",
            )))
            .collect();
        news.load_log_entries(&entries).expect("load log");

        let records = news.fetch_most_popular_articles(1).expect("articles");
        assert_eq!(
            records,
            vec![ArticleHitRecord {
                title: "My Title".to_string(),
                hits: 5,
            }]
        );
    }

    #[test]
    fn load_with_dangling_author_rolls_back_whole_batch() {
        let temp = tempdir().expect("tempdir");
        let news = fresh_database(&temp);
        seed_one_article(&news);

        let result = news.load_articles(&[
            ArticleRecord {
                id: 2,
                author: 1,
                title: "Kept?".to_string(),
                slug: "kept".to_string(),
                lead: None,
                body: None,
                time: "2016-08-15 18:55:10".to_string(),
            },
            ArticleRecord {
                id: 3,
                author: 99,
                title: "Orphan".to_string(),
                slug: "orphan".to_string(),
                lead: None,
                body: None,
                time: "2016-08-15 18:55:10".to_string(),
            },
        ]);
        assert!(result.is_err());

        let count: i64 = news
            .with_session(AccessMode::ReadOnly, |connection| {
                Ok(connection.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?)
            })
            .expect("count articles");
        assert_eq!(count, 1);
    }

    #[test]
    fn provisioning_twice_rejects_the_second_attempt() {
        let temp = tempdir().expect("tempdir");
        let news = fresh_database(&temp);

        assert_eq!(
            news.create_daily_status_log_view().expect("first"),
            ViewProvisioning::Created
        );
        match news.create_daily_status_log_view().expect("second") {
            ViewProvisioning::Rejected(message) => assert!(!message.is_empty()),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn provisioning_without_log_table_is_rejected_not_failed() {
        let temp = tempdir().expect("tempdir");
        let news = NewsDatabase::open(NewsDbConfig {
            db_path: temp.path().join(NEWS_DB_FILE),
        });

        let outcome = news.create_daily_status_log_view().expect("session opens");
        assert!(matches!(outcome, ViewProvisioning::Rejected(_)));
    }

    #[test]
    fn provisioning_fails_when_database_is_unreachable() {
        let temp = tempdir().expect("tempdir");
        let news = NewsDatabase::open(NewsDbConfig {
            db_path: temp.path().join("missing").join(NEWS_DB_FILE),
        });

        let error = news.create_daily_status_log_view().expect_err("should fail");
        assert!(matches!(error, WarehouseError::DuckDb(_)));
    }

    #[test]
    fn error_summary_rejects_out_of_range_cutoff() {
        let temp = tempdir().expect("tempdir");
        let news = fresh_database(&temp);
        news.create_daily_status_log_view().expect("provision");

        for cutoff in [-0.1, 1.5, f64::NAN] {
            let error = news.fetch_error_summary(cutoff).expect_err("should reject");
            assert!(matches!(error, WarehouseError::QueryRejected(_)));
        }
    }

    #[test]
    fn error_summary_without_view_fails() {
        let temp = tempdir().expect("tempdir");
        let news = fresh_database(&temp);

        let error = news.fetch_error_summary(0.01).expect_err("view missing");
        assert!(matches!(error, WarehouseError::DuckDb(_)));
    }
}
