//! Shared handler state.
//!
//! # Invariants
//! - The SQLite connection is only touched on the blocking pool.
//! - One request holds the connection at a time.

use crate::api::error::ApiError;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub struct AppState {
    db: Arc<Mutex<Connection>>,
    token_ttl_ms: i64,
}

impl AppState {
    /// Wraps an already migrated connection.
    pub fn new(conn: Connection, token_ttl_ms: i64) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            token_ttl_ms,
        }
    }

    pub fn token_ttl_ms(&self) -> i64 {
        self.token_ttl_ms
    }

    /// Runs `work` against the connection on the blocking thread pool.
    pub async fn with_conn<T, F>(&self, work: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| ApiError::Internal("database lock poisoned".into()))?;
            work(&*conn)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("blocking task failed: {err}")))?
    }
}
