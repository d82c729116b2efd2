//! Core domain logic for the SamaCarnet medical-records backend.
//! This crate is the single source of truth for storage invariants:
//! tenant scoping, soft deletes, the visit audit trail and the personnel
//! taxonomy.

pub mod codec;
pub mod db;
pub mod logging;
pub mod model;
pub mod password;
pub mod repo;
pub mod seed;
pub mod service;

pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::medical_history::{MedicalHistory, MedicalHistoryType, Severity};
pub use model::patient::{BloodType, EmergencyContact, Gender, Medication, Patient};
pub use model::personnel::{Personnel, PersonnelCategory, PersonnelSubcategory, PersonnelType};
pub use model::qr_code::QrCode;
pub use model::super_admin::SuperAdmin;
pub use model::tenant::{SubscriptionPlan, Tenant, TenantStatus};
pub use model::user::{Role, RoleName, User};
pub use model::visit::{Visit, VisitAction, VisitHistory, VisitStatus};
pub use model::ValidationError;
pub use repo::{RepoError, RepoResult};
pub use seed::{seed_demo_data, SeedError, SeedReport};
pub use service::auth_service::{AuthError, AuthService, LoginOutcome, UserSummary};
pub use service::patient_service::{PatientService, PatientServiceError};
pub use service::qr_code_service::QrCodeService;
pub use service::taxonomy_service::{TaxonomyError, TaxonomyService};
pub use service::visit_service::{TransitionContext, VisitService, VisitServiceError, VisitUpdate};

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
