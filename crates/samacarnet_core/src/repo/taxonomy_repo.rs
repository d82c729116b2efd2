//! Personnel taxonomy repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist the category > subcategory > personnel-type hierarchy.
//! - Keep ordering rules inside the repository boundary.
//!
//! # Invariants
//! - Categories list by `sort_order ASC, id ASC`.
//! - Subcategories list by `sort_order ASC, id ASC`.
//! - Personnel types list by `level ASC, sort_order ASC, id ASC`.
//! - The hierarchy is exactly two levels; no recursive lookups exist.

use super::{bool_to_int, read_bool, RepoError, RepoResult};
use crate::model::personnel::{
    CategoryId, PersonnelCategory, PersonnelSubcategory, PersonnelType, PersonnelTypeId,
    SubcategoryId,
};
use rusqlite::{params, Connection, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT
    id,
    name,
    display_name,
    description,
    sort_order,
    is_active
FROM personnel_categories";

const SUBCATEGORY_SELECT_SQL: &str = "SELECT
    id,
    category_id,
    name,
    display_name,
    description,
    sort_order,
    is_active
FROM personnel_subcategories";

const PERSONNEL_TYPE_SELECT_SQL: &str = "SELECT
    id,
    subcategory_id,
    name,
    display_name,
    level,
    sort_order,
    is_active
FROM personnel_types";

pub trait TaxonomyRepository {
    fn create_category(&self, category: &PersonnelCategory) -> RepoResult<CategoryId>;
    fn create_subcategory(&self, subcategory: &PersonnelSubcategory) -> RepoResult<SubcategoryId>;
    fn create_personnel_type(&self, personnel_type: &PersonnelType) -> RepoResult<PersonnelTypeId>;
    fn get_category(&self, id: CategoryId) -> RepoResult<Option<PersonnelCategory>>;
    fn get_subcategory(&self, id: SubcategoryId) -> RepoResult<Option<PersonnelSubcategory>>;
    fn get_personnel_type(&self, id: PersonnelTypeId) -> RepoResult<Option<PersonnelType>>;
    fn find_category(&self, name: &str) -> RepoResult<Option<PersonnelCategory>>;
    fn find_subcategory(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> RepoResult<Option<PersonnelSubcategory>>;
    fn list_categories(&self, include_inactive: bool) -> RepoResult<Vec<PersonnelCategory>>;
    fn list_subcategories(
        &self,
        category_id: CategoryId,
        include_inactive: bool,
    ) -> RepoResult<Vec<PersonnelSubcategory>>;
    fn list_personnel_types(
        &self,
        subcategory_id: SubcategoryId,
        include_inactive: bool,
    ) -> RepoResult<Vec<PersonnelType>>;
    fn set_subcategory_active(&self, id: SubcategoryId, is_active: bool) -> RepoResult<()>;
}

pub struct SqliteTaxonomyRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaxonomyRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl TaxonomyRepository for SqliteTaxonomyRepository<'_> {
    fn create_category(&self, category: &PersonnelCategory) -> RepoResult<CategoryId> {
        category.validate()?;
        self.conn.execute(
            "INSERT INTO personnel_categories (
                name,
                display_name,
                description,
                sort_order,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                category.name.trim(),
                category.display_name.trim(),
                category.description.as_deref(),
                category.sort_order,
                bool_to_int(category.is_active),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_subcategory(&self, subcategory: &PersonnelSubcategory) -> RepoResult<SubcategoryId> {
        subcategory.validate()?;
        self.conn.execute(
            "INSERT INTO personnel_subcategories (
                category_id,
                name,
                display_name,
                description,
                sort_order,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                subcategory.category_id,
                subcategory.name.trim(),
                subcategory.display_name.trim(),
                subcategory.description.as_deref(),
                subcategory.sort_order,
                bool_to_int(subcategory.is_active),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn create_personnel_type(&self, personnel_type: &PersonnelType) -> RepoResult<PersonnelTypeId> {
        personnel_type.validate()?;
        self.conn.execute(
            "INSERT INTO personnel_types (
                subcategory_id,
                name,
                display_name,
                level,
                sort_order,
                is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                personnel_type.subcategory_id,
                personnel_type.name.trim(),
                personnel_type.display_name.trim(),
                personnel_type.level,
                personnel_type.sort_order,
                bool_to_int(personnel_type.is_active),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_category(&self, id: CategoryId) -> RepoResult<Option<PersonnelCategory>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }
        Ok(None)
    }

    fn get_subcategory(&self, id: SubcategoryId) -> RepoResult<Option<PersonnelSubcategory>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SUBCATEGORY_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subcategory_row(row)?));
        }
        Ok(None)
    }

    fn get_personnel_type(&self, id: PersonnelTypeId) -> RepoResult<Option<PersonnelType>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSONNEL_TYPE_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_personnel_type_row(row)?));
        }
        Ok(None)
    }

    fn find_category(&self, name: &str) -> RepoResult<Option<PersonnelCategory>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATEGORY_SELECT_SQL} WHERE name = ?1;"))?;
        let mut rows = stmt.query([name.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_category_row(row)?));
        }
        Ok(None)
    }

    fn find_subcategory(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> RepoResult<Option<PersonnelSubcategory>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBCATEGORY_SELECT_SQL} WHERE category_id = ?1 AND name = ?2;"
        ))?;
        let mut rows = stmt.query(params![category_id, name.trim()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_subcategory_row(row)?));
        }
        Ok(None)
    }

    fn list_categories(&self, include_inactive: bool) -> RepoResult<Vec<PersonnelCategory>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CATEGORY_SELECT_SQL}
             WHERE (?1 = 1 OR is_active = 1)
             ORDER BY sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([include_inactive])?;
        let mut categories = Vec::new();
        while let Some(row) = rows.next()? {
            categories.push(parse_category_row(row)?);
        }
        Ok(categories)
    }

    fn list_subcategories(
        &self,
        category_id: CategoryId,
        include_inactive: bool,
    ) -> RepoResult<Vec<PersonnelSubcategory>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SUBCATEGORY_SELECT_SQL}
             WHERE category_id = ?1
               AND (?2 = 1 OR is_active = 1)
             ORDER BY sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![category_id, include_inactive])?;
        let mut subcategories = Vec::new();
        while let Some(row) = rows.next()? {
            subcategories.push(parse_subcategory_row(row)?);
        }
        Ok(subcategories)
    }

    fn list_personnel_types(
        &self,
        subcategory_id: SubcategoryId,
        include_inactive: bool,
    ) -> RepoResult<Vec<PersonnelType>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PERSONNEL_TYPE_SELECT_SQL}
             WHERE subcategory_id = ?1
               AND (?2 = 1 OR is_active = 1)
             ORDER BY level ASC, sort_order ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params![subcategory_id, include_inactive])?;
        let mut types = Vec::new();
        while let Some(row) = rows.next()? {
            types.push(parse_personnel_type_row(row)?);
        }
        Ok(types)
    }

    fn set_subcategory_active(&self, id: SubcategoryId, is_active: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE personnel_subcategories
             SET is_active = ?1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?2;",
            params![bool_to_int(is_active), id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: "personnel subcategory",
                id,
            });
        }
        Ok(())
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<PersonnelCategory> {
    Ok(PersonnelCategory {
        id: row.get("id")?,
        name: row.get("name")?,
        display_name: row.get("display_name")?,
        description: row.get("description")?,
        sort_order: row.get("sort_order")?,
        is_active: read_bool(row, "is_active")?,
    })
}

fn parse_subcategory_row(row: &Row<'_>) -> RepoResult<PersonnelSubcategory> {
    Ok(PersonnelSubcategory {
        id: row.get("id")?,
        category_id: row.get("category_id")?,
        name: row.get("name")?,
        display_name: row.get("display_name")?,
        description: row.get("description")?,
        sort_order: row.get("sort_order")?,
        is_active: read_bool(row, "is_active")?,
    })
}

fn parse_personnel_type_row(row: &Row<'_>) -> RepoResult<PersonnelType> {
    Ok(PersonnelType {
        id: row.get("id")?,
        subcategory_id: row.get("subcategory_id")?,
        name: row.get("name")?,
        display_name: row.get("display_name")?,
        level: row.get("level")?,
        sort_order: row.get("sort_order")?,
        is_active: read_bool(row, "is_active")?,
    })
}
