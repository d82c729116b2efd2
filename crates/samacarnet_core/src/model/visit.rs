//! Visits and their append-only history.
//!
//! # Invariants
//! - `VisitHistory` rows are immutable once inserted.
//! - `action_date` is when the underlying event happened, which may differ
//!   from the row's `created_at`.
//! - Only `scheduled` visits accept further transitions.

use super::patient::PatientId;
use super::personnel::PersonnelId;
use super::tenant::TenantId;
use super::{db_enum, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type VisitId = i64;
pub type VisitHistoryId = i64;

db_enum! {
    pub enum VisitStatus {
        Scheduled => "scheduled",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

db_enum! {
    /// Lifecycle transition recorded in the visit audit trail.
    pub enum VisitAction {
        Created => "created",
        Updated => "updated",
        Cancelled => "cancelled",
        Completed => "completed",
        Rescheduled => "rescheduled",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub tenant_id: TenantId,
    pub patient_id: PatientId,
    pub personnel_id: PersonnelId,
    /// Epoch ms.
    pub scheduled_at: i64,
    pub status: VisitStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Visit {
    pub fn new(
        tenant_id: TenantId,
        patient_id: PatientId,
        personnel_id: PersonnelId,
        scheduled_at: i64,
    ) -> Self {
        Self {
            id: 0,
            tenant_id,
            patient_id,
            personnel_id,
            scheduled_at,
            status: VisitStatus::Scheduled,
            reason: None,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Terminal visits accept no further lifecycle transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, VisitStatus::Completed | VisitStatus::Cancelled)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.scheduled_at < 0 {
            return Err(ValidationError::OutOfRange {
                field: "scheduled_at",
                value: self.scheduled_at,
            });
        }
        Ok(())
    }
}

/// One audit-trail row. Constructed by the visit service, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitHistory {
    pub id: VisitHistoryId,
    pub visit_id: VisitId,
    /// Who performed the action.
    pub personnel_id: PersonnelId,
    pub action: VisitAction,
    /// Opaque structured delta, usually `{field: {from, to}}`.
    pub changes: Value,
    pub reason: Option<String>,
    pub action_date: i64,
    pub created_at: i64,
}

/// Insert payload for [`VisitHistory`]; storage assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisitHistory {
    pub visit_id: VisitId,
    pub personnel_id: PersonnelId,
    pub action: VisitAction,
    pub changes: Value,
    pub reason: Option<String>,
    pub action_date: i64,
}
