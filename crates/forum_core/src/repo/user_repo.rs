//! User reference repository.
//!
//! Only what the forum core needs: create a referencable row, look it up,
//! and list digest subscribers.

use crate::model::digest::DigestFrequency;
use crate::model::user::{User, UserId};
use crate::repo::post_repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub trait UserRepository {
    fn create_user(
        &self,
        email: &str,
        digest_frequency: Option<DigestFrequency>,
    ) -> RepoResult<User>;
    fn get_user(&self, user_id: UserId) -> RepoResult<Option<User>>;
    /// Users subscribed to `frequency`, ordered by id.
    fn list_digest_subscribers(&self, frequency: DigestFrequency) -> RepoResult<Vec<User>>;
}

pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(
        &self,
        email: &str,
        digest_frequency: Option<DigestFrequency>,
    ) -> RepoResult<User> {
        self.conn.execute(
            "INSERT INTO users (email, digest_frequency) VALUES (?1, ?2);",
            params![email, digest_frequency.map(DigestFrequency::as_db_str)],
        )?;
        Ok(User {
            id: self.conn.last_insert_rowid(),
            email: email.to_string(),
            digest_frequency,
        })
    }

    fn get_user(&self, user_id: UserId) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, email, digest_frequency FROM users WHERE id = ?1;",
                [user_id],
                read_user_columns,
            )
            .optional()?;
        row.map(build_user).transpose()
    }

    fn list_digest_subscribers(&self, frequency: DigestFrequency) -> RepoResult<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, email, digest_frequency
             FROM users
             WHERE digest_frequency = ?1
             ORDER BY id ASC;",
        )?;
        let rows = stmt
            .query_map([frequency.as_db_str()], read_user_columns)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(build_user).collect()
    }
}

pub(crate) fn user_exists(conn: &Connection, user_id: UserId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
        [user_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

type UserColumns = (UserId, String, Option<String>);

fn read_user_columns(row: &Row<'_>) -> rusqlite::Result<UserColumns> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn build_user((id, email, frequency): UserColumns) -> RepoResult<User> {
    let digest_frequency = match frequency {
        Some(value) => Some(DigestFrequency::from_db_str(&value).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid digest frequency `{value}` in users.digest_frequency"
            ))
        })?),
        None => None,
    };
    Ok(User {
        id,
        email,
        digest_frequency,
    })
}
