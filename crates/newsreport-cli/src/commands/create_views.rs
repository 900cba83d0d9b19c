use std::io::Write;

use newsreport_warehouse::{NewsDatabase, ViewProvisioning};

use crate::error::CliError;

/// Provision the `daily_status_log` view.
///
/// A view that already exists is reported and tolerated; an unreachable
/// database is not.
pub fn run(news: &NewsDatabase, out: &mut impl Write) -> Result<(), CliError> {
    writeln!(out, "adding daily_status_log view to news database...")?;
    if let ViewProvisioning::Rejected(message) = news.create_daily_status_log_view()? {
        writeln!(out, "Error: {message}")?;
    }
    writeln!(out, "done.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsreport_warehouse::NewsDbConfig;
    use tempfile::tempdir;

    fn provision(news: &NewsDatabase) -> (Result<(), CliError>, String) {
        let mut buffer = Vec::new();
        let result = run(news, &mut buffer);
        (result, String::from_utf8(buffer).expect("utf-8 output"))
    }

    #[test]
    fn second_run_prints_error_and_still_succeeds() {
        let temp = tempdir().expect("tempdir");
        let news = NewsDatabase::open(NewsDbConfig {
            db_path: temp.path().join("news.duckdb"),
        });
        news.initialize_schema().expect("initialize schema");

        let (first, text) = provision(&news);
        first.expect("first run");
        assert_eq!(
            text,
            "adding daily_status_log view to news database...\ndone.\n"
        );

        let (second, text) = provision(&news);
        second.expect("second run");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("Error: "));
        assert_eq!(lines[2], "done.");
    }

    #[test]
    fn unreachable_database_is_fatal() {
        let temp = tempdir().expect("tempdir");
        let news = NewsDatabase::open(NewsDbConfig {
            db_path: temp.path().join("missing").join("news.duckdb"),
        });

        let (result, _) = provision(&news);
        let error = result.expect_err("should fail");
        assert_eq!(error.exit_code(), 2);
    }
}
