//! Base tables of the news database.
//!
//! Production databases ship with this schema already in place; these
//! migrations exist for local setup and fixtures.

use ::duckdb::Connection;
use tracing::debug;

struct Migration {
    version: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "0001_news_tables",
        sql: r#"
CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    bio TEXT
);

CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY,
    author INTEGER NOT NULL REFERENCES authors(id),
    title TEXT NOT NULL,
    slug TEXT NOT NULL UNIQUE,
    lead TEXT,
    body TEXT,
    "time" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS log (
    path TEXT,
    ip TEXT,
    method TEXT,
    status TEXT,
    "time" TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    },
    Migration {
        version: "0002_indexes",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_log_time ON log("time");
CREATE INDEX IF NOT EXISTS idx_articles_author ON articles(author);
"#,
    },
];

/// Apply every migration not yet recorded in `schema_migrations`.
///
/// # Errors
/// Returns an error if any migration statement fails.
pub fn apply_migrations(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version TEXT PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#,
    )?;

    for migration in MIGRATIONS {
        let applied_count: i64 = connection.query_row(
            "SELECT COUNT(*) FROM schema_migrations WHERE version = ?",
            [migration.version],
            |row| row.get(0),
        )?;

        if applied_count == 0 {
            connection.execute_batch(migration.sql)?;
            connection.execute(
                "INSERT INTO schema_migrations (version) VALUES (?)",
                [migration.version],
            )?;
            debug!(version = migration.version, "migration applied");
        }
    }

    Ok(())
}
