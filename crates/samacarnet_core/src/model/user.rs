//! User and role models.
//!
//! # Invariants
//! - `email` is unique per tenant, stored lowercase.
//! - Platform-level super-admin users have no tenant.
//! - `password_hash` is never serialized.

use super::tenant::TenantId;
use super::{db_enum, require_email, require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type UserId = i64;
pub type RoleId = i64;

db_enum! {
    /// Built-in role names.
    pub enum RoleName {
        SuperAdmin => "super_admin",
        Admin => "admin",
        Doctor => "doctor",
        Nurse => "nurse",
        Receptionist => "receptionist",
        Patient => "patient",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    pub role_id: RoleId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub last_login_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl User {
    /// Creates an active user; `password_hash` must already be hashed.
    pub fn new(
        tenant_id: Option<TenantId>,
        role_id: RoleId,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            tenant_id,
            role_id,
            email: normalize_email(&email.into()),
            password_hash: password_hash.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            is_active: true,
            last_login_at: None,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_email("email", &self.email)?;
        require_text("password_hash", &self.password_hash)?;
        require_text("first_name", &self.first_name)?;
        require_text("last_name", &self.last_name)?;
        if self.deleted_at.is_some() && self.is_active {
            return Err(ValidationError::DeletedButActive);
        }
        Ok(())
    }
}

/// Lowercases and trims an email for storage and lookup.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
