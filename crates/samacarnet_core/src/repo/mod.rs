//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - One explicit repository trait per entity, each with a SQLite
//!   implementation borrowing a migrated connection.
//! - Keep SQL and JSON column codecs inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call the model's `validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Default list queries exclude soft-deleted rows.

use crate::codec::CodecError;
use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::Row;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod medical_history_repo;
pub mod patient_repo;
pub mod personnel_repo;
pub mod qr_code_repo;
pub mod soft_delete;
pub mod super_admin_repo;
pub mod taxonomy_repo;
pub mod tenant_repo;
pub mod token_repo;
pub mod user_repo;
pub mod visit_history_repo;
pub mod visit_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error shared by every repository.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { entity: &'static str, id: i64 },
    InvalidData(String),
}

impl RepoError {
    /// Whether the failure came from a unique/foreign-key/check constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_constraint_violation())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<CodecError> for RepoError {
    fn from(value: CodecError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

pub(crate) fn read_bool(row: &Row<'_>, column: &'static str) -> RepoResult<bool> {
    match row.get::<_, i64>(column)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}

pub(crate) fn read_enum<T>(
    row: &Row<'_>,
    column: &'static str,
    parse: fn(&str) -> Option<T>,
) -> RepoResult<T> {
    let text: String = row.get(column)?;
    parse(&text)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid value `{text}` in {column}")))
}

pub(crate) fn read_optional_enum<T>(
    row: &Row<'_>,
    column: &'static str,
    parse: fn(&str) -> Option<T>,
) -> RepoResult<Option<T>> {
    match row.get::<_, Option<String>>(column)? {
        Some(text) => parse(&text).map(Some).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid value `{text}` in {column}"))
        }),
        None => Ok(None),
    }
}

/// Appends `LIMIT/OFFSET` clauses the way every paged listing does.
pub(crate) fn push_pagination(
    sql: &mut String,
    bind_values: &mut Vec<rusqlite::types::Value>,
    limit: Option<u32>,
    offset: u32,
) {
    use rusqlite::types::Value;

    if let Some(limit) = limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(offset)));
        }
    } else if offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(offset)));
    }
}
