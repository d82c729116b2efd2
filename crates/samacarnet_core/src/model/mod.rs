//! Domain models for tenant-scoped medical records.
//!
//! # Responsibility
//! - Define plain data structures for every persisted entity.
//! - Pair each structure with an explicit `validate()` instead of column
//!   annotations.
//!
//! # Invariants
//! - Every entity is identified by an `i64` row id assigned by storage.
//! - Deletion is represented by soft-delete tombstones, not hard delete.
//! - Timestamps are Unix epoch milliseconds.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static ISO_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12]\d|3[01])$").expect("valid date regex")
});
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Declares a text-backed enum with stable storage/wire names.
macro_rules! db_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $text)] $variant ),+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Storage and wire representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Parses the storage representation; `None` for unknown values.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use db_enum;

pub mod medical_history;
pub mod patient;
pub mod personnel;
pub mod qr_code;
pub mod super_admin;
pub mod tenant;
pub mod user;
pub mod visit;

/// Validation failure raised before any write reaches storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is blank after trim.
    BlankField(&'static str),
    /// Field does not match its expected format.
    InvalidFormat { field: &'static str, value: String },
    /// Numeric field is outside its allowed range.
    OutOfRange { field: &'static str, value: i64 },
    /// Row carries a tombstone but is still flagged active.
    DeletedButActive,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "`{field}` must not be blank"),
            Self::InvalidFormat { field, value } => {
                write!(f, "`{field}` has invalid format: `{value}`")
            }
            Self::OutOfRange { field, value } => write!(f, "`{field}` out of range: {value}"),
            Self::DeletedButActive => write!(f, "deleted rows must not be active"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

pub(crate) fn require_iso_date(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !ISO_DATE_RE.is_match(value) {
        return Err(ValidationError::InvalidFormat {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if !EMAIL_RE.is_match(value) {
        return Err(ValidationError::InvalidFormat {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{require_email, require_iso_date, require_text, ValidationError};

    #[test]
    fn iso_dates_are_checked_structurally() {
        assert!(require_iso_date("d", "1990-04-17").is_ok());
        assert!(require_iso_date("d", "1990-13-01").is_err());
        assert!(require_iso_date("d", "17/04/1990").is_err());
    }

    #[test]
    fn emails_need_an_at_and_a_domain() {
        assert!(require_email("email", "awa.diop@samacarnet.sn").is_ok());
        assert!(require_email("email", "awa.diop").is_err());
    }

    #[test]
    fn blank_text_is_rejected() {
        assert_eq!(
            require_text("title", "  "),
            Err(ValidationError::BlankField("title"))
        );
    }
}
