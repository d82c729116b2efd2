//! Personnel taxonomy use-case service.
//!
//! # Responsibility
//! - Expose read paths over the category > subcategory > type hierarchy.
//! - Render human-readable classification paths.
//!
//! # Invariants
//! - Subcategory listings only ever query by `category_id`; the hierarchy
//!   is exactly two levels deep.
//! - Ordering is delegated to the repository and never re-sorted here.

use crate::model::personnel::{
    display_path, CategoryId, PersonnelCategory, PersonnelSubcategory, PersonnelType,
    SubcategoryId,
};
use crate::repo::taxonomy_repo::TaxonomyRepository;
use crate::repo::RepoError;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from taxonomy service operations.
#[derive(Debug)]
pub enum TaxonomyError {
    CategoryNotFound(CategoryId),
    SubcategoryNotFound(SubcategoryId),
    Repo(RepoError),
}

impl Display for TaxonomyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CategoryNotFound(id) => write!(f, "personnel category not found: {id}"),
            Self::SubcategoryNotFound(id) => write!(f, "personnel subcategory not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TaxonomyError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TaxonomyError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// One active subcategory with its active personnel types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubcategoryNode {
    pub subcategory: PersonnelSubcategory,
    pub personnel_types: Vec<PersonnelType>,
}

/// One active category with its active subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryNode {
    pub category: PersonnelCategory,
    pub subcategories: Vec<SubcategoryNode>,
}

/// Taxonomy service facade.
pub struct TaxonomyService<R: TaxonomyRepository> {
    repo: R,
}

impl<R: TaxonomyRepository> TaxonomyService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_categories(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<PersonnelCategory>, TaxonomyError> {
        Ok(self.repo.list_categories(include_inactive)?)
    }

    /// Active subcategories of one category, ordered by `sort_order`.
    /// An unknown category yields an empty list.
    pub fn list_active_subcategories(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<PersonnelSubcategory>, TaxonomyError> {
        Ok(self.repo.list_subcategories(category_id, false)?)
    }

    /// Active personnel types of one subcategory, ordered by `level`
    /// then `sort_order`.
    pub fn list_personnel_types(
        &self,
        subcategory_id: SubcategoryId,
    ) -> Result<Vec<PersonnelType>, TaxonomyError> {
        self.require_subcategory(subcategory_id)?;
        Ok(self.repo.list_personnel_types(subcategory_id, false)?)
    }

    /// Renders `"<category> > <subcategory>"` for one subcategory.
    pub fn full_path(&self, subcategory_id: SubcategoryId) -> Result<String, TaxonomyError> {
        let subcategory = self.require_subcategory(subcategory_id)?;
        let category = self
            .repo
            .get_category(subcategory.category_id)?
            .ok_or(TaxonomyError::CategoryNotFound(subcategory.category_id))?;
        Ok(display_path(&category, &subcategory))
    }

    /// Active hierarchy as nested nodes, in listing order.
    pub fn tree(&self) -> Result<Vec<CategoryNode>, TaxonomyError> {
        let mut nodes = Vec::new();
        for category in self.repo.list_categories(false)? {
            let mut subcategories = Vec::new();
            for subcategory in self.repo.list_subcategories(category.id, false)? {
                let personnel_types = self.repo.list_personnel_types(subcategory.id, false)?;
                subcategories.push(SubcategoryNode {
                    subcategory,
                    personnel_types,
                });
            }
            nodes.push(CategoryNode {
                category,
                subcategories,
            });
        }
        Ok(nodes)
    }

    fn require_subcategory(
        &self,
        id: SubcategoryId,
    ) -> Result<PersonnelSubcategory, TaxonomyError> {
        self.repo
            .get_subcategory(id)?
            .ok_or(TaxonomyError::SubcategoryNotFound(id))
    }
}
