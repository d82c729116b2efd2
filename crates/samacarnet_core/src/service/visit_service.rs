//! Visit lifecycle service and audit-trail recorder.
//!
//! # Responsibility
//! - Apply visit lifecycle transitions (schedule, update, reschedule,
//!   cancel, complete).
//! - Record exactly one `visit_histories` row per applied transition.
//!
//! # Invariants
//! - The visit mutation and its history row commit in one immediate
//!   transaction; a failure leaves neither behind.
//! - `completed` and `cancelled` visits accept no further transitions.
//! - History payloads are `{field: {"from": old, "to": new}}` objects.

use crate::model::personnel::PersonnelId;
use crate::model::visit::{
    NewVisitHistory, Visit, VisitAction, VisitHistory, VisitId, VisitStatus,
};
use crate::repo::visit_history_repo::{SqliteVisitHistoryRepository, VisitHistoryRepository};
use crate::repo::visit_repo::{SqliteVisitRepository, VisitRepository};
use crate::repo::RepoError;
use log::{info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde_json::{json, Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Who performed a transition and when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionContext {
    pub actor: PersonnelId,
    /// Epoch ms of the underlying event.
    pub action_date: i64,
}

impl TransitionContext {
    /// Context stamped with the current wall-clock time.
    pub fn now(actor: PersonnelId) -> Self {
        Self::at(actor, crate::now_epoch_ms())
    }

    pub fn at(actor: PersonnelId, action_date: i64) -> Self {
        Self { actor, action_date }
    }
}

/// Field edits for a scheduled visit. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitUpdate {
    pub personnel_id: Option<PersonnelId>,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Errors from visit lifecycle operations.
#[derive(Debug)]
pub enum VisitServiceError {
    VisitNotFound(VisitId),
    /// The visit is in a state that does not allow `action`.
    InvalidTransition {
        visit_id: VisitId,
        from: VisitStatus,
        action: VisitAction,
    },
    /// The requested edit would not change any field.
    NoChanges(VisitId),
    /// Cancellation without a non-blank reason.
    MissingReason,
    Repo(RepoError),
}

impl Display for VisitServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VisitNotFound(id) => write!(f, "visit not found: {id}"),
            Self::InvalidTransition {
                visit_id,
                from,
                action,
            } => write!(f, "visit {visit_id} is {from}; cannot apply `{action}`"),
            Self::NoChanges(id) => write!(f, "visit {id} update changes nothing"),
            Self::MissingReason => write!(f, "cancellation requires a reason"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for VisitServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for VisitServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound {
                entity: "visit",
                id,
            } => Self::VisitNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for VisitServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

pub type VisitServiceResult<T> = Result<T, VisitServiceError>;

/// Visit lifecycle facade over one borrowed connection.
pub struct VisitService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> VisitService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Inserts a new `scheduled` visit and records the `created` action.
    pub fn schedule_visit(
        &self,
        visit: &Visit,
        ctx: TransitionContext,
    ) -> VisitServiceResult<Visit> {
        let mut draft = visit.clone();
        draft.status = VisitStatus::Scheduled;

        let mut changes = Map::new();
        push_delta(&mut changes, "status", Value::Null, json!(draft.status));
        push_delta(
            &mut changes,
            "scheduled_at",
            Value::Null,
            json!(draft.scheduled_at),
        );
        push_delta(
            &mut changes,
            "personnel_id",
            Value::Null,
            json!(draft.personnel_id),
        );
        if let Some(reason) = draft.reason.as_deref() {
            push_delta(&mut changes, "reason", Value::Null, json!(reason));
        }

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let visit_id = SqliteVisitRepository::new(&tx).create_visit(&draft)?;
        SqliteVisitHistoryRepository::new(&tx).append(&NewVisitHistory {
            visit_id,
            personnel_id: ctx.actor,
            action: VisitAction::Created,
            changes: Value::Object(changes),
            reason: None,
            action_date: ctx.action_date,
        })?;
        let created = load_visit(&tx, visit_id)?;
        tx.commit()?;

        info!("event=visit_transition module=visit status=ok action=created visit_id={visit_id}");
        Ok(created)
    }

    /// Edits assignment, reason or notes of a scheduled visit.
    pub fn update_visit(
        &self,
        visit_id: VisitId,
        update: &VisitUpdate,
        ctx: TransitionContext,
    ) -> VisitServiceResult<Visit> {
        self.transition(visit_id, VisitAction::Updated, ctx, None, |visit, changes| {
            if let Some(personnel_id) = update.personnel_id {
                if personnel_id != visit.personnel_id {
                    push_delta(
                        changes,
                        "personnel_id",
                        json!(visit.personnel_id),
                        json!(personnel_id),
                    );
                    visit.personnel_id = personnel_id;
                }
            }
            if let Some(reason) = update.reason.as_ref() {
                if visit.reason.as_ref() != Some(reason) {
                    push_delta(changes, "reason", json!(visit.reason), json!(reason));
                    visit.reason = Some(reason.clone());
                }
            }
            if let Some(notes) = update.notes.as_ref() {
                if visit.notes.as_ref() != Some(notes) {
                    push_delta(changes, "notes", json!(visit.notes), json!(notes));
                    visit.notes = Some(notes.clone());
                }
            }
            Ok(())
        })
    }

    /// Moves a scheduled visit to a new time.
    pub fn reschedule_visit(
        &self,
        visit_id: VisitId,
        scheduled_at: i64,
        reason: Option<&str>,
        ctx: TransitionContext,
    ) -> VisitServiceResult<Visit> {
        let reason = non_blank(reason);
        self.transition(
            visit_id,
            VisitAction::Rescheduled,
            ctx,
            reason,
            |visit, changes| {
                if visit.scheduled_at != scheduled_at {
                    push_delta(
                        changes,
                        "scheduled_at",
                        json!(visit.scheduled_at),
                        json!(scheduled_at),
                    );
                    visit.scheduled_at = scheduled_at;
                }
                Ok(())
            },
        )
    }

    /// Cancels a scheduled visit. `reason` must be non-blank.
    pub fn cancel_visit(
        &self,
        visit_id: VisitId,
        reason: &str,
        ctx: TransitionContext,
    ) -> VisitServiceResult<Visit> {
        let Some(reason) = non_blank(Some(reason)) else {
            return Err(VisitServiceError::MissingReason);
        };
        self.transition(
            visit_id,
            VisitAction::Cancelled,
            ctx,
            Some(reason),
            |visit, changes| {
                set_status(visit, changes, VisitStatus::Cancelled);
                Ok(())
            },
        )
    }

    /// Marks a scheduled visit completed, optionally replacing its notes.
    pub fn complete_visit(
        &self,
        visit_id: VisitId,
        notes: Option<&str>,
        ctx: TransitionContext,
    ) -> VisitServiceResult<Visit> {
        let notes = non_blank(notes);
        self.transition(
            visit_id,
            VisitAction::Completed,
            ctx,
            None,
            |visit, changes| {
                set_status(visit, changes, VisitStatus::Completed);
                if let Some(notes) = notes {
                    if visit.notes.as_deref() != Some(notes.as_str()) {
                        push_delta(changes, "notes", json!(visit.notes), json!(notes));
                        visit.notes = Some(notes);
                    }
                }
                Ok(())
            },
        )
    }

    pub fn get_visit(&self, visit_id: VisitId) -> VisitServiceResult<Visit> {
        load_visit(self.conn, visit_id)
    }

    /// Full audit trail of one visit in chronological order.
    pub fn history(&self, visit_id: VisitId) -> VisitServiceResult<Vec<VisitHistory>> {
        load_visit(self.conn, visit_id)?;
        Ok(SqliteVisitHistoryRepository::new(self.conn).list_for_visit(visit_id)?)
    }

    pub fn latest_history(&self, visit_id: VisitId) -> VisitServiceResult<Option<VisitHistory>> {
        load_visit(self.conn, visit_id)?;
        Ok(SqliteVisitHistoryRepository::new(self.conn).latest_for_visit(visit_id)?)
    }

    fn transition<F>(
        &self,
        visit_id: VisitId,
        action: VisitAction,
        ctx: TransitionContext,
        reason: Option<String>,
        apply: F,
    ) -> VisitServiceResult<Visit>
    where
        F: FnOnce(&mut Visit, &mut Map<String, Value>) -> VisitServiceResult<()>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut visit = load_visit(&tx, visit_id)?;
        if visit.is_terminal() {
            warn!(
                "event=visit_transition module=visit status=error action={action} visit_id={visit_id} reason=terminal_state from={}",
                visit.status
            );
            return Err(VisitServiceError::InvalidTransition {
                visit_id,
                from: visit.status,
                action,
            });
        }

        let mut changes = Map::new();
        apply(&mut visit, &mut changes)?;
        if changes.is_empty() {
            return Err(VisitServiceError::NoChanges(visit_id));
        }

        SqliteVisitRepository::new(&tx).update_visit(&visit)?;
        SqliteVisitHistoryRepository::new(&tx).append(&NewVisitHistory {
            visit_id,
            personnel_id: ctx.actor,
            action,
            changes: Value::Object(changes),
            reason,
            action_date: ctx.action_date,
        })?;
        let updated = load_visit(&tx, visit_id)?;
        tx.commit()?;

        info!("event=visit_transition module=visit status=ok action={action} visit_id={visit_id}");
        Ok(updated)
    }
}

fn load_visit(conn: &Connection, visit_id: VisitId) -> VisitServiceResult<Visit> {
    SqliteVisitRepository::new(conn)
        .get_visit(visit_id)?
        .ok_or(VisitServiceError::VisitNotFound(visit_id))
}

fn set_status(visit: &mut Visit, changes: &mut Map<String, Value>, status: VisitStatus) {
    push_delta(changes, "status", json!(visit.status), json!(status));
    visit.status = status;
}

fn push_delta(changes: &mut Map<String, Value>, field: &str, from: Value, to: Value) {
    changes.insert(field.to_string(), json!({ "from": from, "to": to }));
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::{non_blank, push_delta};
    use serde_json::{json, Map};

    #[test]
    fn blank_text_is_dropped() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(" late ")), Some("late".to_string()));
    }

    #[test]
    fn delta_uses_from_to_shape() {
        let mut changes = Map::new();
        push_delta(&mut changes, "scheduled_at", json!(1), json!(2));
        assert_eq!(
            serde_json::Value::Object(changes),
            json!({"scheduled_at": {"from": 1, "to": 2}})
        );
    }
}
