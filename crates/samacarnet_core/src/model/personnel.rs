//! Personnel taxonomy and personnel records.
//!
//! The taxonomy is fixed at two levels: a category owns subcategories, and
//! each subcategory owns personnel types ranked by `level`.

use super::tenant::TenantId;
use super::user::UserId;
use super::{require_text, ValidationError};
use serde::{Deserialize, Serialize};

pub type CategoryId = i64;
pub type SubcategoryId = i64;
pub type PersonnelTypeId = i64;
pub type PersonnelId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelCategory {
    pub id: CategoryId,
    /// Machine name, unique.
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelSubcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    /// Machine name, unique within its category.
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub sort_order: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonnelType {
    pub id: PersonnelTypeId,
    pub subcategory_id: SubcategoryId,
    pub name: String,
    pub display_name: String,
    /// Seniority rank; lower levels list first.
    pub level: i64,
    pub sort_order: i64,
    pub is_active: bool,
}

/// A staff member of one tenant, bound to a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Personnel {
    pub id: PersonnelId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub personnel_type_id: PersonnelTypeId,
    pub license_number: Option<String>,
    pub is_active: bool,
}

impl PersonnelCategory {
    pub fn new(name: impl Into<String>, display_name: impl Into<String>, sort_order: i64) -> Self {
        Self {
            id: 0,
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            sort_order,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("display_name", &self.display_name)
    }
}

impl PersonnelSubcategory {
    pub fn new(
        category_id: CategoryId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        sort_order: i64,
    ) -> Self {
        Self {
            id: 0,
            category_id,
            name: name.into(),
            display_name: display_name.into(),
            description: None,
            sort_order,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("display_name", &self.display_name)
    }
}

impl PersonnelType {
    pub fn new(
        subcategory_id: SubcategoryId,
        name: impl Into<String>,
        display_name: impl Into<String>,
        level: i64,
        sort_order: i64,
    ) -> Self {
        Self {
            id: 0,
            subcategory_id,
            name: name.into(),
            display_name: display_name.into(),
            level,
            sort_order,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text("name", &self.name)?;
        require_text("display_name", &self.display_name)?;
        if self.level < 1 {
            return Err(ValidationError::OutOfRange {
                field: "level",
                value: self.level,
            });
        }
        Ok(())
    }
}

/// Renders `"<category> > <subcategory>"` from display names.
pub fn display_path(category: &PersonnelCategory, subcategory: &PersonnelSubcategory) -> String {
    format!("{} > {}", category.display_name, subcategory.display_name)
}
