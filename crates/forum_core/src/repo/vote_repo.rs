//! Vote repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `votes(post_id, user_id)` is UNIQUE; a duplicate insert is treated as
//!   success so `add_vote` stays idempotent under concurrent callers.

use crate::db::is_unique_violation;
use crate::model::post::PostId;
use crate::model::user::UserId;
use crate::model::vote::Vote;
use crate::repo::post_repo::{ensure_connection_ready, post_exists, RepoError, RepoResult};
use crate::repo::user_repo::user_exists;
use log::debug;
use rusqlite::{params, Connection};

pub trait VoteRepository {
    fn add_vote(&self, post_id: PostId, user_id: UserId) -> RepoResult<()>;
    fn has_voted(&self, post_id: PostId, user_id: UserId) -> RepoResult<bool>;
    fn count_votes(&self, post_id: PostId) -> RepoResult<u32>;
    fn list_votes(&self, post_id: PostId) -> RepoResult<Vec<Vote>>;
}

pub struct SqliteVoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVoteRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl VoteRepository for SqliteVoteRepository<'_> {
    fn add_vote(&self, post_id: PostId, user_id: UserId) -> RepoResult<()> {
        if !post_exists(self.conn, post_id)? {
            return Err(RepoError::NotFound(post_id));
        }
        if !user_exists(self.conn, user_id)? {
            return Err(RepoError::UserNotFound(user_id));
        }

        match self.conn.execute(
            "INSERT INTO votes (post_id, user_id) VALUES (?1, ?2);",
            params![post_id, user_id],
        ) {
            Ok(_) => {
                debug!("event=vote_add module=repo status=ok post_id={post_id} user_id={user_id}");
                Ok(())
            }
            Err(err) if is_unique_violation(&err) => {
                debug!(
                    "event=vote_add module=repo status=duplicate post_id={post_id} user_id={user_id}"
                );
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn has_voted(&self, post_id: PostId, user_id: UserId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM votes WHERE post_id = ?1 AND user_id = ?2
            );",
            params![post_id, user_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn count_votes(&self, post_id: PostId) -> RepoResult<u32> {
        let count: u32 = self.conn.query_row(
            "SELECT COUNT(*) FROM votes WHERE post_id = ?1;",
            [post_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_votes(&self, post_id: PostId) -> RepoResult<Vec<Vote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, user_id, created_at
             FROM votes
             WHERE post_id = ?1
             ORDER BY id ASC;",
        )?;
        let votes = stmt
            .query_map([post_id], |row| {
                Ok(Vote {
                    id: row.get(0)?,
                    post_id: row.get(1)?,
                    user_id: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(votes)
    }
}
