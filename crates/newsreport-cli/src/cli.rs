//! CLI argument definitions for newsreport.
//!
//! # Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--n` | `3` | Number of articles in the popularity section |
//! | `--p` | `0.01` | Error-rate cutoff as a fraction |
//! | `--create-views` | `false` | Provision the supporting view and exit; also spelled `--create_views` or `-create_views` |
//! | `--db-path` | see below | Path to the `news` DuckDB file |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! Without `--db-path` the database is `$NEWS_DB_PATH`, then
//! `$NEWS_HOME/news.duckdb`, then `~/.newsreport/news.duckdb`.
//!
//! # Examples
//!
//! ```bash
//! # One-time setup
//! newsreport --create-views
//!
//! # Top 5 articles, days with more than 2% errors
//! newsreport --n 5 --p 0.02
//! ```

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

/// A simple information summary for the news database.
#[derive(Debug, Parser)]
#[command(name = "newsreport", author, version, about)]
pub struct Cli {
    /// Number of articles displayed in the report.
    #[arg(long = "n", value_name = "COUNT", default_value_t = 3)]
    pub n_articles: usize,

    /// Fraction of requests used as cutoff for error reporting.
    #[arg(long = "p", value_name = "FRACTION", default_value_t = 0.01, value_parser = parse_cutoff)]
    pub pct_cutoff: f64,

    /// Create the supporting views in the database instead of reporting.
    #[arg(long = "create-views", alias = "create_views", default_value_t = false)]
    pub create_views: bool,

    /// Path to the news database file.
    #[arg(long, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, default_value_t = false)]
    pub verbose: bool,
}

impl Cli {
    /// Parse the process arguments, accepting the single-dash `-create_views`
    /// spelling older scripts pass.
    pub fn parse_args() -> Self {
        Self::parse_from(normalize_legacy_flags(std::env::args_os()))
    }
}

/// Rewrite `-create_views` to `--create_views`; clap only takes multi-letter
/// names after two dashes.
fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(|arg| {
            let arg: OsString = arg.into();
            if arg == "-create_views" {
                OsString::from("--create_views")
            } else {
                arg
            }
        })
        .collect()
}

fn parse_cutoff(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(format!("cutoff must be between 0 and 1, got {raw}"));
    }
    Ok(value)
}
