//! Read-only report queries.
//!
//! An article matches a log entry when its slug is a substring of the request
//! path. Slugs that are substrings of other slugs therefore also count hits
//! on those longer paths.

use ::duckdb::{Connection, ToSql};
use tracing::debug;

use crate::models::{ArticleHitRecord, AuthorViewRecord, DailyStatusRecord, ErrorRateRecord};
use crate::WarehouseError;

/// Parameters: `?` = row limit.
const MOST_POPULAR_ARTICLES_SQL: &str = r#"
SELECT articles.title, COUNT(*) AS hits
FROM articles
JOIN log ON log.path LIKE '%' || articles.slug || '%'
GROUP BY articles.title
ORDER BY hits DESC, articles.title ASC
LIMIT ?
"#;

const AUTHORS_BY_POPULARITY_SQL: &str = r#"
SELECT sq.name, COUNT(*) AS views
FROM (
    SELECT authors.name, articles.slug
    FROM articles
    JOIN authors ON articles.author = authors.id
) AS sq
JOIN log ON log.path LIKE '%' || sq.slug || '%'
GROUP BY sq.name
ORDER BY views DESC, sq.name ASC
"#;

/// Parameters: `?` = cutoff ratio.
///
/// A day with zero total hits divides by NULL, so its ratio is NULL and the
/// comparison drops it.
const ERROR_SUMMARY_SQL: &str = r#"
SELECT CAST(dt AS VARCHAR) AS day, error_ratio
FROM (
    SELECT
        dt,
        CAST(SUM(CASE WHEN status LIKE '%404 NOT FOUND%' THEN hits ELSE 0 END) AS DOUBLE)
            / NULLIF(CAST(SUM(hits) AS DOUBLE), 0) AS error_ratio
    FROM daily_status_log
    GROUP BY dt
) AS sq
WHERE error_ratio > ?
ORDER BY dt ASC
"#;

const DAILY_STATUS_LOG_SQL: &str = r#"
SELECT CAST(dt AS VARCHAR) AS day, status, hits
FROM daily_status_log
ORDER BY dt ASC, status ASC
"#;

pub fn most_popular_articles(
    connection: &Connection,
    limit: usize,
) -> Result<Vec<ArticleHitRecord>, WarehouseError> {
    let limit = i64::try_from(limit).map_err(|_| {
        WarehouseError::QueryRejected(format!("article limit {limit} is too large"))
    })?;

    let mut statement = connection.prepare(MOST_POPULAR_ARTICLES_SQL)?;
    let params: [&dyn ToSql; 1] = [&limit];
    let rows = statement
        .query_map(params.as_slice(), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    debug!(rows = rows.len(), limit, "most popular articles fetched");

    rows.into_iter()
        .map(|(title, hits)| {
            Ok(ArticleHitRecord {
                hits: non_negative(hits, "hits")?,
                title,
            })
        })
        .collect()
}

pub fn authors_by_popularity(
    connection: &Connection,
) -> Result<Vec<AuthorViewRecord>, WarehouseError> {
    let mut statement = connection.prepare(AUTHORS_BY_POPULARITY_SQL)?;
    let rows = statement
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    debug!(rows = rows.len(), "authors by popularity fetched");

    rows.into_iter()
        .map(|(name, views)| {
            Ok(AuthorViewRecord {
                views: non_negative(views, "views")?,
                name,
            })
        })
        .collect()
}

pub fn error_summary(
    connection: &Connection,
    cutoff: f64,
) -> Result<Vec<ErrorRateRecord>, WarehouseError> {
    if !cutoff.is_finite() || !(0.0..=1.0).contains(&cutoff) {
        return Err(WarehouseError::QueryRejected(format!(
            "error cutoff must be within [0, 1], got {cutoff}"
        )));
    }

    let mut statement = connection.prepare(ERROR_SUMMARY_SQL)?;
    let params: [&dyn ToSql; 1] = [&cutoff];
    let records = statement
        .query_map(params.as_slice(), |row| {
            Ok(ErrorRateRecord {
                day: row.get(0)?,
                error_ratio: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    debug!(rows = records.len(), cutoff, "error summary fetched");

    Ok(records)
}

pub fn daily_status_log(connection: &Connection) -> Result<Vec<DailyStatusRecord>, WarehouseError> {
    let mut statement = connection.prepare(DAILY_STATUS_LOG_SQL)?;
    let rows = statement
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(day, status, hits)| {
            Ok(DailyStatusRecord {
                day,
                status,
                hits: non_negative(hits, "hits")?,
            })
        })
        .collect()
}

fn non_negative(value: i64, column: &str) -> Result<u64, WarehouseError> {
    u64::try_from(value)
        .map_err(|_| WarehouseError::InvalidData(format!("negative {column} count: {value}")))
}
