//! Comment repository contracts and SQLite implementation.

use crate::model::comment::{validate_comment_body, Comment, CommentId};
use crate::model::post::PostId;
use crate::model::user::UserId;
use crate::repo::post_repo::{ensure_connection_ready, post_exists, RepoError, RepoResult};
use crate::repo::user_repo::user_exists;
use rusqlite::{params, Connection, Row};

const COMMENT_SELECT_SQL: &str = "SELECT id, post_id, user_id, body, created_at FROM comments";

pub trait CommentRepository {
    fn create_comment(&self, post_id: PostId, user_id: UserId, body: &str)
        -> RepoResult<Comment>;
    /// Comments of one post, oldest first.
    fn list_comments(&self, post_id: PostId) -> RepoResult<Vec<Comment>>;
}

pub struct SqliteCommentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommentRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CommentRepository for SqliteCommentRepository<'_> {
    fn create_comment(
        &self,
        post_id: PostId,
        user_id: UserId,
        body: &str,
    ) -> RepoResult<Comment> {
        validate_comment_body(body)?;
        if !post_exists(self.conn, post_id)? {
            return Err(RepoError::NotFound(post_id));
        }
        if !user_exists(self.conn, user_id)? {
            return Err(RepoError::UserNotFound(user_id));
        }

        self.conn.execute(
            "INSERT INTO comments (post_id, user_id, body) VALUES (?1, ?2, ?3);",
            params![post_id, user_id, body],
        )?;
        let comment_id: CommentId = self.conn.last_insert_rowid();

        self.conn
            .query_row(
                &format!("{COMMENT_SELECT_SQL} WHERE id = ?1;"),
                [comment_id],
                parse_comment_row,
            )
            .map_err(RepoError::from)
    }

    fn list_comments(&self, post_id: PostId) -> RepoResult<Vec<Comment>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COMMENT_SELECT_SQL} WHERE post_id = ?1 ORDER BY created_at ASC, id ASC;"
        ))?;
        let comments = stmt
            .query_map([post_id], parse_comment_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(comments)
    }
}

fn parse_comment_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        post_id: row.get("post_id")?,
        user_id: row.get("user_id")?,
        body: row.get("body")?,
        created_at: row.get("created_at")?,
    })
}
