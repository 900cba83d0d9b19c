//! Plain-text rendering of report sections.

use std::fmt::Display;
use std::io::{self, Write};

use newsreport_warehouse::{ArticleHitRecord, AuthorViewRecord, ErrorRateRecord};

/// Render a fraction as a percentage with two decimals: `0.01` -> `1.00%`.
pub fn percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Write `title` underlined with `=` to the same character width.
pub fn heading(out: &mut impl Write, title: &str) -> io::Result<()> {
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "=".repeat(title.chars().count()))
}

/// Write one titled section.
///
/// A failing `fetch` is reported as a single `Error:` line in place of the
/// rows; the section still ends with its blank line so the next one can
/// follow. Only write failures are returned.
pub fn section<T, E, F, R>(out: &mut impl Write, title: &str, fetch: F, row: R) -> io::Result<()>
where
    E: Display,
    F: FnOnce() -> Result<Vec<T>, E>,
    R: Fn(&T) -> String,
{
    heading(out, title)?;
    match fetch() {
        Ok(records) => {
            for record in &records {
                writeln!(out, "{}", row(record))?;
            }
        }
        Err(error) => {
            let message = error.to_string();
            writeln!(out, "Error: {}", message.split_whitespace().collect::<Vec<_>>().join(" "))?;
        }
    }
    writeln!(out)
}

pub fn article_row(record: &ArticleHitRecord) -> String {
    format!("\"{}\" -- {} views", record.title, record.hits)
}

pub fn author_row(record: &AuthorViewRecord) -> String {
    format!("{} - {} views", record.name, record.views)
}

pub fn error_rate_row(record: &ErrorRateRecord) -> String {
    format!("{} - {} errors", record.day, percent(record.error_ratio))
}
