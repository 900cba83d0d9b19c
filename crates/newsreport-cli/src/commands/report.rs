//! The news database report.
//!
//! Sections run one after another, each against its own session. A section
//! whose query fails prints an `Error:` line and the report moves on, so the
//! closing `DONE.` is always reached.

use std::io::{self, Write};

use newsreport_warehouse::NewsDatabase;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::output::{self, percent};

#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    /// Rows in the popular articles section.
    pub n_articles: usize,
    /// Error-rate fraction a day must exceed to be listed.
    pub pct_cutoff: f64,
}

/// Print the full report: banner, the three sections, and the completion
/// marker.
pub fn run(
    news: &NewsDatabase,
    options: &ReportOptions,
    generated_at: OffsetDateTime,
    out: &mut impl Write,
) -> io::Result<()> {
    let timestamp = generated_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| generated_at.to_string());
    writeln!(out, "NEWS DATABASE REPORT ({timestamp})")?;
    writeln!(out)?;

    popular_articles_view(news, options.n_articles, out)?;
    authors_view(news, out)?;
    error_summary_view(news, options.pct_cutoff, out)?;

    writeln!(out, "DONE.")
}

pub fn popular_articles_view(
    news: &NewsDatabase,
    n_articles: usize,
    out: &mut impl Write,
) -> io::Result<()> {
    let title = format!("most {n_articles} popular articles of all time");
    output::section(
        out,
        &title,
        || news.fetch_most_popular_articles(n_articles),
        output::article_row,
    )
}

pub fn authors_view(news: &NewsDatabase, out: &mut impl Write) -> io::Result<()> {
    output::section(
        out,
        "most popular article authors of all time",
        || news.fetch_authors_by_popularity(),
        output::author_row,
    )
}

pub fn error_summary_view(
    news: &NewsDatabase,
    pct_cutoff: f64,
    out: &mut impl Write,
) -> io::Result<()> {
    let title = format!(
        "days did more than {} of requests lead to errors",
        percent(pct_cutoff)
    );
    output::section(
        out,
        &title,
        || news.fetch_error_summary(pct_cutoff),
        output::error_rate_row,
    )
}
