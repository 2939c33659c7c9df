//! Tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Resolve normalized tag titles to tag rows, creating missing ones.
//!
//! # Invariants
//! - At most one row exists per normalized title (`tags.title` is UNIQUE).
//! - Resolution is select → insert → re-select on unique violation, so a
//!   concurrent writer creating the same title is never surfaced as an
//!   error.

use crate::db::is_unique_violation;
use crate::model::tag::{normalize_tag_title, parse_tags_string, Tag};
use crate::repo::post_repo::{ensure_connection_ready, RepoError, RepoResult};
use log::debug;
use rusqlite::{Connection, OptionalExtension};

/// Repository interface for tag lookup and lazy creation.
pub trait TagRepository {
    /// Finds a tag by title; the input is normalized first.
    fn find_tag(&self, title: &str) -> RepoResult<Option<Tag>>;
    /// Returns the tag for `title`, creating it when missing.
    fn find_or_create_tag(&self, title: &str) -> RepoResult<Tag>;
    /// Parses a free-text tag string and resolves each distinct title.
    fn resolve_tags(&self, tags_string: &str) -> RepoResult<Vec<Tag>>;
    /// Returns all known tags sorted by title.
    fn list_tags(&self) -> RepoResult<Vec<Tag>>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn find_tag(&self, title: &str) -> RepoResult<Option<Tag>> {
        match normalize_tag_title(title) {
            Some(normalized) => select_tag(self.conn, &normalized),
            None => Ok(None),
        }
    }

    fn find_or_create_tag(&self, title: &str) -> RepoResult<Tag> {
        find_or_create_in(self.conn, title)
    }

    fn resolve_tags(&self, tags_string: &str) -> RepoResult<Vec<Tag>> {
        resolve_tags_in(self.conn, tags_string)
    }

    fn list_tags(&self) -> RepoResult<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title FROM tags ORDER BY title ASC;")?;
        let mut rows = stmt.query([])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(Tag {
                id: row.get("id")?,
                title: row.get("title")?,
            });
        }
        Ok(tags)
    }
}

/// Resolves a tag string on `conn`, which may be an open transaction.
pub(crate) fn resolve_tags_in(conn: &Connection, tags_string: &str) -> RepoResult<Vec<Tag>> {
    parse_tags_string(tags_string)
        .iter()
        .map(|title| find_or_create_in(conn, title))
        .collect()
}

fn find_or_create_in(conn: &Connection, title: &str) -> RepoResult<Tag> {
    let normalized =
        normalize_tag_title(title).ok_or_else(|| RepoError::InvalidTag(title.to_string()))?;
    if let Some(tag) = select_tag(conn, &normalized)? {
        return Ok(tag);
    }
    insert_or_fetch_tag(conn, &normalized)
}

fn select_tag(conn: &Connection, title: &str) -> RepoResult<Option<Tag>> {
    let tag = conn
        .query_row(
            "SELECT id, title FROM tags WHERE title = ?1;",
            [title],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    title: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(tag)
}

fn insert_or_fetch_tag(conn: &Connection, title: &str) -> RepoResult<Tag> {
    match conn.execute("INSERT INTO tags (title) VALUES (?1);", [title]) {
        Ok(_) => {
            let id = conn.last_insert_rowid();
            debug!("event=tag_create module=repo status=ok tag_id={id}");
            Ok(Tag {
                id,
                title: title.to_string(),
            })
        }
        Err(err) if is_unique_violation(&err) => {
            debug!("event=tag_create module=repo status=conflict action=reselect");
            select_tag(conn, title)?.ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "tag `{title}` reported as duplicate but not found"
                ))
            })
        }
        Err(err) => Err(err.into()),
    }
}
