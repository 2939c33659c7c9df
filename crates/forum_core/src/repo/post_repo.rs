//! Post repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `posts` storage.
//! - Own tag-link replacement (`set_post_tags`) with atomic semantics.
//! - Expose vote/comment/tag operations scoped to one post so services can
//!   be generic over a single repository.
//!
//! # Invariants
//! - Write paths validate write models before SQL mutations.
//! - A post write and the tag string it carries commit together or not at
//!   all; tag rows created by a failed write roll back with it.
//! - `set_post_tags` replaces the whole link set in one transaction.
//! - Titles are stored exactly as given.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::comment::{Comment, CommentValidationError};
use crate::model::post::{
    render_markdown_html, NewPost, Post, PostId, PostKind, PostUpdate, PostValidationError,
};
use crate::model::tag::Tag;
use crate::model::user::UserId;
use crate::repo::comment_repo::{CommentRepository, SqliteCommentRepository};
use crate::repo::tag_repo::{resolve_tags_in, SqliteTagRepository, TagRepository};
use crate::repo::user_repo::user_exists;
use crate::repo::vote_repo::{SqliteVoteRepository, VoteRepository};
use log::{debug, info};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) const POST_SELECT_SQL: &str = "SELECT
    posts.id AS id,
    posts.user_id AS user_id,
    posts.type AS type,
    posts.title AS title,
    posts.body_markdown AS body_markdown,
    posts.body_html AS body_html,
    posts.url AS url,
    posts.created_at AS created_at,
    posts.updated_at AS updated_at
FROM posts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all forum persistence operations.
#[derive(Debug)]
pub enum RepoError {
    /// Post write model failed validation.
    Validation(PostValidationError),
    /// Comment write model failed validation.
    InvalidComment(CommentValidationError),
    /// Tag title is blank after normalization.
    InvalidTag(String),
    Db(DbError),
    /// Target post does not exist.
    NotFound(PostId),
    /// Referenced user does not exist.
    UserNotFound(UserId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidComment(err) => write!(f, "{err}"),
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "post not found: {id}"),
            Self::UserNotFound(id) => write!(f, "user not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidComment(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PostValidationError> for RepoError {
    fn from(value: PostValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CommentValidationError> for RepoError {
    fn from(value: CommentValidationError) -> Self {
        Self::InvalidComment(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing posts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostListQuery {
    /// Restricts results to one kind.
    pub kind: Option<PostKind>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for posts and their per-post relations.
pub trait PostRepository {
    /// Inserts the post and applies its `tags_string` in one transaction.
    fn create_post(&mut self, post: &NewPost) -> RepoResult<PostId>;
    /// Replaces title/body/url, and the tag set when `tags_string` is set,
    /// in one transaction.
    fn update_post(&mut self, post_id: PostId, update: &PostUpdate) -> RepoResult<()>;
    fn get_post(&self, post_id: PostId) -> RepoResult<Option<Post>>;
    /// Lists posts newest first.
    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>>;
    /// Hard-deletes a post together with its links, comments and votes.
    fn delete_post(&self, post_id: PostId) -> RepoResult<()>;
    /// Parses a tag string and resolves every title to a tag row.
    fn resolve_tags(&self, tags_string: &str) -> RepoResult<Vec<Tag>>;
    /// Replaces all tag links of the post in one transaction.
    fn set_post_tags(&mut self, post_id: PostId, tags: &[Tag]) -> RepoResult<()>;
    fn add_comment(&self, post_id: PostId, user_id: UserId, body: &str) -> RepoResult<Comment>;
    fn list_comments(&self, post_id: PostId) -> RepoResult<Vec<Comment>>;
    /// Records a vote; repeating it is a no-op.
    fn add_vote(&self, post_id: PostId, user_id: UserId) -> RepoResult<()>;
    fn has_voted(&self, post_id: PostId, user_id: UserId) -> RepoResult<bool>;
    fn count_votes(&self, post_id: PostId) -> RepoResult<u32>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqlitePostRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create_post(&mut self, post: &NewPost) -> RepoResult<PostId> {
        post.validate()?;

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !user_exists(&tx, post.user_id)? {
            return Err(RepoError::UserNotFound(post.user_id));
        }

        tx.execute(
            "INSERT INTO posts (
                user_id,
                type,
                title,
                body_markdown,
                body_html,
                url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                post.user_id,
                post.kind.type_name(),
                post.title.as_str(),
                post.body_markdown.as_str(),
                render_markdown_html(&post.body_markdown),
                post.url.as_deref(),
            ],
        )?;
        let post_id = tx.last_insert_rowid();

        let tag_count = match post.tags_string.as_deref() {
            Some(tags_string) => {
                let tags = resolve_tags_in(&tx, tags_string)?;
                link_tags(&tx, post_id, &tags)?
            }
            None => 0,
        };

        tx.commit()?;
        info!(
            "event=post_create module=repo status=ok post_id={} kind={} tag_count={}",
            post_id,
            post.kind.behavior().label,
            tag_count
        );
        Ok(post_id)
    }

    fn update_post(&mut self, post_id: PostId, update: &PostUpdate) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let kind = load_post_kind(&tx, post_id)?.ok_or(RepoError::NotFound(post_id))?;
        update.validate(kind)?;

        tx.execute(
            "UPDATE posts
             SET
                title = ?2,
                body_markdown = ?3,
                body_html = ?4,
                url = ?5,
                updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE id = ?1;",
            params![
                post_id,
                update.title.as_str(),
                update.body_markdown.as_str(),
                render_markdown_html(&update.body_markdown),
                update.url.as_deref(),
            ],
        )?;

        if let Some(tags_string) = update.tags_string.as_deref() {
            let tags = resolve_tags_in(&tx, tags_string)?;
            tx.execute("DELETE FROM post_tags WHERE post_id = ?1;", [post_id])?;
            link_tags(&tx, post_id, &tags)?;
        }

        tx.commit()?;
        Ok(())
    }

    fn get_post(&self, post_id: PostId) -> RepoResult<Option<Post>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{POST_SELECT_SQL} WHERE posts.id = ?1;"))?;
        let mut rows = stmt.query([post_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_post_row(self.conn, row)?));
        }

        Ok(None)
    }

    fn list_posts(&self, query: &PostListQuery) -> RepoResult<Vec<Post>> {
        let mut sql = format!("{POST_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(kind) = query.kind {
            sql.push_str(" AND posts.type = ?");
            bind_values.push(Value::Text(kind.type_name().to_string()));
        }

        sql.push_str(" ORDER BY posts.created_at DESC, posts.id DESC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(self.conn, row)?);
        }

        Ok(posts)
    }

    fn delete_post(&self, post_id: PostId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1;", [post_id])?;

        if changed == 0 {
            return Err(RepoError::NotFound(post_id));
        }

        info!("event=post_delete module=repo status=ok post_id={post_id}");
        Ok(())
    }

    fn resolve_tags(&self, tags_string: &str) -> RepoResult<Vec<Tag>> {
        SqliteTagRepository::try_new(self.conn)?.resolve_tags(tags_string)
    }

    fn set_post_tags(&mut self, post_id: PostId, tags: &[Tag]) -> RepoResult<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        if load_post_kind(&tx, post_id)?.is_none() {
            return Err(RepoError::NotFound(post_id));
        }

        tx.execute("DELETE FROM post_tags WHERE post_id = ?1;", [post_id])?;
        let tag_count = link_tags(&tx, post_id, tags)?;

        tx.execute(
            "UPDATE posts
             SET updated_at = (CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER))
             WHERE id = ?1;",
            [post_id],
        )?;

        tx.commit()?;
        debug!(
            "event=post_set_tags module=repo status=ok post_id={} tag_count={}",
            post_id, tag_count
        );
        Ok(())
    }

    fn add_comment(&self, post_id: PostId, user_id: UserId, body: &str) -> RepoResult<Comment> {
        SqliteCommentRepository::try_new(self.conn)?.create_comment(post_id, user_id, body)
    }

    fn list_comments(&self, post_id: PostId) -> RepoResult<Vec<Comment>> {
        SqliteCommentRepository::try_new(self.conn)?.list_comments(post_id)
    }

    fn add_vote(&self, post_id: PostId, user_id: UserId) -> RepoResult<()> {
        SqliteVoteRepository::try_new(self.conn)?.add_vote(post_id, user_id)
    }

    fn has_voted(&self, post_id: PostId, user_id: UserId) -> RepoResult<bool> {
        SqliteVoteRepository::try_new(self.conn)?.has_voted(post_id, user_id)
    }

    fn count_votes(&self, post_id: PostId) -> RepoResult<u32> {
        SqliteVoteRepository::try_new(self.conn)?.count_votes(post_id)
    }
}

/// Links `tags` to a post with no current links; repeated ids link once.
fn link_tags(conn: &Connection, post_id: PostId, tags: &[Tag]) -> RepoResult<usize> {
    let mut linked = HashSet::new();
    for tag in tags {
        if !linked.insert(tag.id) {
            continue;
        }
        conn.execute(
            "INSERT INTO post_tags (post_id, tag_id) VALUES (?1, ?2);",
            params![post_id, tag.id],
        )?;
    }
    Ok(linked.len())
}

/// Decodes one row selected with [`POST_SELECT_SQL`] and loads its tags.
pub(crate) fn parse_post_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Post> {
    let id: PostId = row.get("id")?;
    let type_text: String = row.get("type")?;
    let kind = PostKind::from_type_name(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid post type `{type_text}` in posts.type"))
    })?;

    Ok(Post {
        id,
        user_id: row.get("user_id")?,
        kind,
        title: row.get("title")?,
        body_markdown: row.get("body_markdown")?,
        body_html: row.get("body_html")?,
        url: row.get("url")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
        tags: load_tags_for_post(conn, id)?,
    })
}

fn load_tags_for_post(conn: &Connection, post_id: PostId) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.title
         FROM post_tags pt
         INNER JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id = ?1
         ORDER BY t.title ASC;",
    )?;
    let mut rows = stmt.query([post_id])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(row.get(0)?);
    }
    Ok(tags)
}

pub(crate) fn post_exists(conn: &Connection, post_id: PostId) -> RepoResult<bool> {
    Ok(load_post_kind(conn, post_id)?.is_some())
}

fn load_post_kind(conn: &Connection, post_id: PostId) -> RepoResult<Option<PostKind>> {
    let type_text: Option<String> = conn
        .query_row("SELECT type FROM posts WHERE id = ?1;", [post_id], |row| {
            row.get(0)
        })
        .optional()?;

    match type_text {
        Some(value) => PostKind::from_type_name(&value)
            .map(Some)
            .ok_or_else(|| RepoError::InvalidData(format!("invalid post type `{value}`"))),
        None => Ok(None),
    }
}

/// Rejects connections that were not opened through [`crate::db::open_db`].
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let expected_version = latest_version();
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}
