//! Derived views backing the report queries.

use ::duckdb::Connection;

/// Name of the per-day, per-status hit count view.
pub const DAILY_STATUS_LOG: &str = "daily_status_log";

/// Plain `CREATE VIEW`: a second run fails in the database instead of
/// replacing the existing definition.
const CREATE_DAILY_STATUS_LOG: &str = r#"
CREATE VIEW daily_status_log AS
SELECT dt, status, COUNT(status) AS hits
FROM (
    SELECT CAST("time" AS DATE) AS dt, status
    FROM log
) AS sq
GROUP BY dt, status;
"#;

/// Create the `daily_status_log` view.
///
/// Each row holds one `(dt, status)` pair, where `dt` is the log timestamp
/// truncated to a calendar day, and `hits` counts the log entries with that
/// status on that day.
///
/// # Errors
/// Returns an error if the view already exists or the `log` table is missing.
pub fn create_daily_status_log_view(connection: &Connection) -> Result<(), ::duckdb::Error> {
    connection.execute_batch(CREATE_DAILY_STATUS_LOG)
}
