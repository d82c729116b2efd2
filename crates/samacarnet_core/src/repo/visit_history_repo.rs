//! Append-only visit audit trail.
//!
//! # Invariants
//! - The only write is `append`; storage triggers reject UPDATE and DELETE.
//! - Chronological order is `action_date ASC, id ASC`: rows sharing an
//!   `action_date` keep insertion order.
//! - "Latest" is the highest `(action_date, id)` pair.

use super::{read_enum, RepoResult};
use crate::codec::{decode_changes, encode_changes};
use crate::model::visit::{NewVisitHistory, VisitAction, VisitHistory, VisitHistoryId, VisitId};
use rusqlite::{params, Connection, Row};

const VISIT_HISTORY_SELECT_SQL: &str = "SELECT
    id,
    visit_id,
    personnel_id,
    action,
    changes,
    reason,
    action_date,
    created_at
FROM visit_histories";

pub trait VisitHistoryRepository {
    fn append(&self, entry: &NewVisitHistory) -> RepoResult<VisitHistoryId>;
    fn list_for_visit(&self, visit_id: VisitId) -> RepoResult<Vec<VisitHistory>>;
    fn latest_for_visit(&self, visit_id: VisitId) -> RepoResult<Option<VisitHistory>>;
    fn count_for_visit(&self, visit_id: VisitId) -> RepoResult<i64>;
}

pub struct SqliteVisitHistoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVisitHistoryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl VisitHistoryRepository for SqliteVisitHistoryRepository<'_> {
    fn append(&self, entry: &NewVisitHistory) -> RepoResult<VisitHistoryId> {
        self.conn.execute(
            "INSERT INTO visit_histories (
                visit_id,
                personnel_id,
                action,
                changes,
                reason,
                action_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                entry.visit_id,
                entry.personnel_id,
                entry.action.as_str(),
                encode_changes(&entry.changes)?,
                entry.reason.as_deref(),
                entry.action_date,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn list_for_visit(&self, visit_id: VisitId) -> RepoResult<Vec<VisitHistory>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VISIT_HISTORY_SELECT_SQL}
             WHERE visit_id = ?1
             ORDER BY action_date ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([visit_id])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_visit_history_row(row)?);
        }
        Ok(entries)
    }

    fn latest_for_visit(&self, visit_id: VisitId) -> RepoResult<Option<VisitHistory>> {
        let mut stmt = self.conn.prepare(&format!(
            "{VISIT_HISTORY_SELECT_SQL}
             WHERE visit_id = ?1
             ORDER BY action_date DESC, id DESC
             LIMIT 1;"
        ))?;
        let mut rows = stmt.query([visit_id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_visit_history_row(row)?));
        }
        Ok(None)
    }

    fn count_for_visit(&self, visit_id: VisitId) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM visit_histories WHERE visit_id = ?1;",
            [visit_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn parse_visit_history_row(row: &Row<'_>) -> RepoResult<VisitHistory> {
    let changes: String = row.get("changes")?;
    Ok(VisitHistory {
        id: row.get("id")?,
        visit_id: row.get("visit_id")?,
        personnel_id: row.get("personnel_id")?,
        action: read_enum(row, "action", VisitAction::parse)?,
        changes: decode_changes(&changes)?,
        reason: row.get("reason")?,
        action_date: row.get("action_date")?,
        created_at: row.get("created_at")?,
    })
}
