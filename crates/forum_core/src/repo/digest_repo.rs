//! Digest checkpoint repository.
//!
//! # Invariants
//! - The latest checkpoint per frequency is the row with the highest id.
//! - Post ids are `AUTOINCREMENT`, so `id > last_post_id` selects exactly the
//!   posts inserted after a checkpoint's window closed.

use crate::model::digest::{DigestFrequency, DigestHistory};
use crate::model::post::{Post, PostId};
use crate::repo::post_repo::{
    ensure_connection_ready, parse_post_row, RepoError, RepoResult, POST_SELECT_SQL,
};
use rusqlite::{params, Connection, OptionalExtension};

pub trait DigestRepository {
    fn latest_history(&self, frequency: DigestFrequency) -> RepoResult<Option<DigestHistory>>;
    /// Records a checkpoint whose window closed after `last_post_id`.
    fn create_history(
        &self,
        frequency: DigestFrequency,
        last_post_id: PostId,
    ) -> RepoResult<DigestHistory>;
    /// Highest post id ever assigned, `0` for an empty store.
    fn max_post_id(&self) -> RepoResult<PostId>;
    /// Posts with `id > last_post_id`, oldest id first.
    fn posts_after(&self, last_post_id: PostId) -> RepoResult<Vec<Post>>;
}

pub struct SqliteDigestRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDigestRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn history_by_id(&self, id: i64) -> RepoResult<Option<DigestHistory>> {
        self.query_history("WHERE id = ?1", params![id])
    }

    fn query_history(
        &self,
        filter: &str,
        params: impl rusqlite::Params,
    ) -> RepoResult<Option<DigestHistory>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, frequency, last_post_id, created_at
                     FROM digest_histories {filter}
                     ORDER BY id DESC LIMIT 1;"
                ),
                params,
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, PostId>(2)?,
                        row.get::<_, i64>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, frequency_text, last_post_id, created_at)| {
            let frequency = DigestFrequency::from_db_str(&frequency_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid frequency `{frequency_text}` in digest_histories.frequency"
                ))
            })?;
            Ok(DigestHistory {
                id,
                frequency,
                last_post_id,
                created_at,
            })
        })
        .transpose()
    }
}

impl DigestRepository for SqliteDigestRepository<'_> {
    fn latest_history(&self, frequency: DigestFrequency) -> RepoResult<Option<DigestHistory>> {
        self.query_history("WHERE frequency = ?1", [frequency.as_db_str()])
    }

    fn create_history(
        &self,
        frequency: DigestFrequency,
        last_post_id: PostId,
    ) -> RepoResult<DigestHistory> {
        self.conn.execute(
            "INSERT INTO digest_histories (frequency, last_post_id) VALUES (?1, ?2);",
            params![frequency.as_db_str(), last_post_id],
        )?;
        let id = self.conn.last_insert_rowid();
        self.history_by_id(id)?.ok_or_else(|| {
            RepoError::InvalidData(format!("digest history {id} missing after insert"))
        })
    }

    fn max_post_id(&self) -> RepoResult<PostId> {
        // High-water mark of `posts.id`, kept even after deletes.
        let from_sequence: Option<PostId> = self
            .conn
            .query_row(
                "SELECT seq FROM sqlite_sequence WHERE name = 'posts';",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(from_sequence.unwrap_or(0))
    }

    fn posts_after(&self, last_post_id: PostId) -> RepoResult<Vec<Post>> {
        let mut stmt = self.conn.prepare(&format!(
            "{POST_SELECT_SQL} WHERE posts.id > ?1 ORDER BY posts.id ASC;"
        ))?;
        let mut rows = stmt.query([last_post_id])?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_post_row(self.conn, row)?);
        }
        Ok(posts)
    }
}
