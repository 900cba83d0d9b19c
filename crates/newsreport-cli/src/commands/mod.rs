mod create_views;
mod report;

use std::io::Write;

use newsreport_warehouse::{NewsDatabase, NewsDbConfig};
use time::OffsetDateTime;

use crate::cli::Cli;
use crate::error::CliError;

use self::report::ReportOptions;

pub fn run(cli: &Cli, out: &mut impl Write) -> Result<(), CliError> {
    let news = match &cli.db_path {
        Some(db_path) => NewsDatabase::open(NewsDbConfig {
            db_path: db_path.clone(),
        }),
        None => NewsDatabase::open_default(),
    };

    if cli.create_views {
        return create_views::run(&news, out);
    }

    let options = ReportOptions {
        n_articles: cli.n_articles,
        pct_cutoff: cli.pct_cutoff,
    };
    report::run(&news, &options, OffsetDateTime::now_utc(), out)?;
    Ok(())
}
