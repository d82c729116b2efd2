//! Issued login token storage.
//!
//! Only SHA-256 hashes of bearer tokens are persisted.

use super::RepoResult;
use crate::model::user::UserId;
use rusqlite::{params, Connection, OptionalExtension};

pub trait ApiTokenRepository {
    fn store_token(&self, user_id: UserId, token_hash: &str, expires_at: i64) -> RepoResult<()>;
    /// Returns the owner of an unexpired token whose user is still live.
    fn find_active_user(&self, token_hash: &str, now_ms: i64) -> RepoResult<Option<UserId>>;
    /// Removes expired tokens and returns how many were dropped.
    fn purge_expired(&self, now_ms: i64) -> RepoResult<usize>;
}

pub struct SqliteApiTokenRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteApiTokenRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ApiTokenRepository for SqliteApiTokenRepository<'_> {
    fn store_token(&self, user_id: UserId, token_hash: &str, expires_at: i64) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO api_tokens (user_id, token_hash, expires_at) VALUES (?1, ?2, ?3);",
            params![user_id, token_hash, expires_at],
        )?;
        Ok(())
    }

    fn find_active_user(&self, token_hash: &str, now_ms: i64) -> RepoResult<Option<UserId>> {
        let user_id = self
            .conn
            .query_row(
                "SELECT t.user_id
                 FROM api_tokens t
                 JOIN users u ON u.id = t.user_id
                 WHERE t.token_hash = ?1
                   AND t.expires_at > ?2
                   AND u.deleted_at IS NULL
                   AND u.is_active = 1;",
                params![token_hash, now_ms],
                |row| row.get(0),
            )
            .optional()?;
        Ok(user_id)
    }

    fn purge_expired(&self, now_ms: i64) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM api_tokens WHERE expires_at <= ?1;", [now_ms])?;
        Ok(removed)
    }
}
