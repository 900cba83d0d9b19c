//! Report rows and loadable base-table rows.

/// One article title with the number of log hits on its slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleHitRecord {
    /// Article title.
    pub title: String,
    /// Log entries whose path contains the article slug.
    pub hits: u64,
}

/// One author with the number of log hits across all of their articles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorViewRecord {
    /// Author name.
    pub name: String,
    /// Log entries whose path contains the slug of any article by the author.
    pub views: u64,
}

/// One row of the `daily_status_log` view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStatusRecord {
    /// Calendar day as `YYYY-MM-DD`.
    pub day: String,
    /// Raw status text, e.g. `200 OK`; `None` groups entries logged without one.
    pub status: Option<String>,
    /// Log entries with this status on this day.
    pub hits: u64,
}

/// A day whose share of `404 NOT FOUND` responses exceeded the cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorRateRecord {
    /// Calendar day as `YYYY-MM-DD`.
    pub day: String,
    /// Fraction of the day's hits that were not found, in `(cutoff, 1]`.
    pub error_ratio: f64,
}

/// An `authors` row.
#[derive(Debug, Clone)]
pub struct AuthorRecord {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
}

/// An `articles` row.
#[derive(Debug, Clone)]
pub struct ArticleRecord {
    pub id: i64,
    /// Foreign key into `authors.id`.
    pub author: i64,
    pub title: String,
    pub slug: String,
    pub lead: Option<String>,
    pub body: Option<String>,
    /// Publication timestamp as ISO 8601 string.
    pub time: String,
}

/// A `log` row: one served request.
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Request path, e.g. `/article/candidate-is-jerk`.
    pub path: String,
    pub ip: Option<String>,
    pub method: Option<String>,
    /// Status line text, e.g. `404 NOT FOUND`.
    pub status: String,
    /// Request timestamp as ISO 8601 string.
    pub time: String,
}

impl LogEntry {
    /// A `GET` entry with no client address.
    pub fn get(path: impl Into<String>, status: impl Into<String>, time: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ip: None,
            method: Some(String::from("GET")),
            status: status.into(),
            time: time.into(),
        }
    }
}
