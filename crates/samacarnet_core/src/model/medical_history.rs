//! Medical history entries attached to a patient.
//!
//! # Invariants
//! - `patient_id` references an existing patient (enforced by storage).
//! - `deleted_at` non-null implies `is_active = false`.
//! - `severity` is nullable and round-trips as `None`.

use super::patient::PatientId;
use super::{db_enum, require_iso_date, require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type MedicalHistoryId = i64;

db_enum! {
    pub enum MedicalHistoryType {
        Allergy => "allergy",
        Condition => "condition",
        Surgery => "surgery",
        Medication => "medication",
        FamilyHistory => "family_history",
    }
}

db_enum! {
    pub enum Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicalHistory {
    pub id: MedicalHistoryId,
    pub patient_id: PatientId,
    /// Serialized as `type` to match the column name.
    #[serde(rename = "type")]
    pub kind: MedicalHistoryType,
    pub title: String,
    pub description: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub date_recorded: String,
    pub severity: Option<Severity>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl MedicalHistory {
    pub fn new(
        patient_id: PatientId,
        kind: MedicalHistoryType,
        title: impl Into<String>,
        date_recorded: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            patient_id,
            kind,
            title: title.into(),
            description: None,
            date_recorded: date_recorded.into(),
            severity: None,
            is_active: true,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("title", &self.title)?;
        require_iso_date("date_recorded", &self.date_recorded)?;
        if self.deleted_at.is_some() && self.is_active {
            return Err(ValidationError::DeletedButActive);
        }
        Ok(())
    }
}
