//! Tenant domain model.
//!
//! A tenant is the isolation boundary for one customer organization. Every
//! tenant-scoped row carries its `tenant_id`.
//!
//! # Invariants
//! - `slug` is lowercase `[a-z0-9-]` and unique across tenants.
//! - A soft-deleted tenant is always `inactive`.

use super::{db_enum, require_text, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SLUG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid slug regex"));

pub type TenantId = i64;

db_enum! {
    /// Operational status of a tenant.
    pub enum TenantStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
    }
}

db_enum! {
    /// Commercial subscription tier.
    pub enum SubscriptionPlan {
        Basic => "basic",
        Standard => "standard",
        Premium => "premium",
        Enterprise => "enterprise",
    }
}

/// Connection parameters for tenants isolated in their own database.
///
/// Stored for the provisioning tooling; this crate never dials them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantDatabase {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl TenantDatabase {
    /// Returns whether enough parameters exist to address a dedicated database.
    pub fn is_dedicated(&self) -> bool {
        self.host.is_some() && self.name.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Assigned by storage; `0` before insert.
    pub id: TenantId,
    pub name: String,
    pub slug: String,
    pub status: TenantStatus,
    pub subscription_plan: SubscriptionPlan,
    pub database: TenantDatabase,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl Tenant {
    /// Creates an active `basic` tenant on the shared database.
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            slug: slug.into(),
            status: TenantStatus::Active,
            subscription_plan: SubscriptionPlan::Basic,
            database: TenantDatabase::default(),
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    /// Whether requests scoped to this tenant may proceed.
    pub fn accepts_requests(&self) -> bool {
        self.deleted_at.is_none() && self.status == TenantStatus::Active
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        if !SLUG_RE.is_match(&self.slug) {
            return Err(ValidationError::InvalidFormat {
                field: "slug",
                value: self.slug.clone(),
            });
        }
        if self.deleted_at.is_some() && self.status != TenantStatus::Inactive {
            return Err(ValidationError::DeletedButActive);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Tenant, TenantStatus};
    use crate::model::ValidationError;

    #[test]
    fn slug_must_be_kebab_case() {
        let mut tenant = Tenant::new("Hôpital Principal", "hopital-principal");
        assert!(tenant.validate().is_ok());

        tenant.slug = "Hopital Principal".to_string();
        assert!(matches!(
            tenant.validate(),
            Err(ValidationError::InvalidFormat { field: "slug", .. })
        ));
    }

    #[test]
    fn suspended_tenants_refuse_requests() {
        let mut tenant = Tenant::new("Clinique", "clinique");
        assert!(tenant.accepts_requests());
        tenant.status = TenantStatus::Suspended;
        assert!(!tenant.accepts_requests());
    }
}
