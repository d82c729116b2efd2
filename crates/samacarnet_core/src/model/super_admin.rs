//! Platform super-administrators.
//!
//! One-to-one with a user. `access_level == "full"` grants everything;
//! otherwise the optional override payload decides per permission.

use super::user::UserId;
use super::{require_text, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type SuperAdminId = i64;

pub const FULL_ACCESS_LEVEL: &str = "full";

/// Explicit per-permission grants or denials.
pub type PermissionOverrides = BTreeMap<String, bool>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuperAdmin {
    pub id: SuperAdminId,
    pub user_id: UserId,
    pub access_level: String,
    pub permissions_override: Option<PermissionOverrides>,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
}

impl SuperAdmin {
    /// Creates an active super-admin with full access.
    pub fn new(user_id: UserId) -> Self {
        Self {
            id: 0,
            user_id,
            access_level: FULL_ACCESS_LEVEL.to_string(),
            permissions_override: None,
            is_active: true,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    pub fn has_full_access(&self) -> bool {
        self.is_active && self.access_level == FULL_ACCESS_LEVEL
    }

    /// Whether this admin holds `permission`. Inactive admins hold nothing.
    pub fn has_permission(&self, permission: &str) -> bool {
        if !self.is_active {
            return false;
        }
        if self.has_full_access() {
            return true;
        }
        self.permissions_override
            .as_ref()
            .and_then(|overrides| overrides.get(permission).copied())
            .unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("access_level", &self.access_level)?;
        if self.deleted_at.is_some() && self.is_active {
            return Err(ValidationError::DeletedButActive);
        }
        Ok(())
    }
}
