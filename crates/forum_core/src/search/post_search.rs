//! Multi-field post search.
//!
//! # Responsibility
//! - Match a query against post title, tag titles, comment bodies and the
//!   markdown body, and union the results.
//!
//! # Invariants
//! - Matching is case-insensitive substring containment with full Unicode
//!   case folding (`fold_case`, registered when the connection is opened).
//! - The query is matched verbatim: no wildcards, no trimming.
//! - Each post appears at most once; results are ordered by `id ASC`.
//! - Blank queries return no results.

use crate::db::{DbError, FOLD_CASE_FN};
use crate::model::post::{Post, PostKind};
use crate::repo::post_repo::{parse_post_row, RepoError, POST_SELECT_SQL};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

/// Search-layer error for DB interaction and result decoding.
#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SearchError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Db(err) => Self::Db(err),
            RepoError::InvalidData(message) => Self::InvalidData(message),
            other => Self::InvalidData(other.to_string()),
        }
    }
}

/// Search options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSearchQuery {
    /// Substring to look for.
    pub text: String,
    /// Optional kind filter.
    pub kind: Option<PostKind>,
    /// Maximum number of posts; `None` returns every match.
    pub limit: Option<u32>,
}

impl PostSearchQuery {
    /// Creates an unfiltered, unbounded query.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: None,
            limit: None,
        }
    }
}

/// Returns posts whose title, tags, comments or body contain the query.
pub fn search_posts(conn: &Connection, query: &PostSearchQuery) -> SearchResult<Vec<Post>> {
    if query.text.trim().is_empty() || query.limit == Some(0) {
        return Ok(Vec::new());
    }

    let started_at = Instant::now();
    let needle = query.text.to_lowercase();
    let mut sql = format!(
        "{POST_SELECT_SQL}
         WHERE (
            instr({FOLD_CASE_FN}(posts.title), ?1) > 0
            OR instr({FOLD_CASE_FN}(posts.body_markdown), ?1) > 0
            OR EXISTS (
                SELECT 1
                FROM post_tags pt
                INNER JOIN tags t ON t.id = pt.tag_id
                WHERE pt.post_id = posts.id
                  AND instr({FOLD_CASE_FN}(t.title), ?1) > 0
            )
            OR EXISTS (
                SELECT 1
                FROM comments c
                WHERE c.post_id = posts.id
                  AND instr({FOLD_CASE_FN}(c.body), ?1) > 0
            )
         )"
    );
    let mut bind_values: Vec<Value> = vec![Value::Text(needle)];

    if let Some(kind) = query.kind {
        sql.push_str(" AND posts.type = ?2");
        bind_values.push(Value::Text(kind.type_name().to_string()));
    }

    sql.push_str(" ORDER BY posts.id ASC");
    if let Some(limit) = query.limit {
        sql.push_str(&format!(" LIMIT ?{}", bind_values.len() + 1));
        bind_values.push(Value::Integer(i64::from(limit)));
    }

    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut posts = Vec::new();
    while let Some(row) = rows.next()? {
        posts.push(parse_post_row(conn, row)?);
    }

    debug!(
        "event=post_search module=search status=ok hits={} duration_ms={}",
        posts.len(),
        started_at.elapsed().as_millis()
    );
    Ok(posts)
}
