//! Entity model for persons and their addresses.
//!
//! # Responsibility
//! - Define the record types mapped to storage tables.
//! - Validate field-level invariants before persistence.
//!
//! # Invariants
//! - Identity is a storage-generated surrogate key; `None` means transient.
//! - A person owns its addresses as a set with value-equality semantics.

pub mod address;
pub mod person;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Field-level validation failure for entity records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelValidationError {
    BlankName,
    BlankCity,
}

impl Display for ModelValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "person name must not be blank"),
            Self::BlankCity => write!(f, "address city must not be blank"),
        }
    }
}

impl Error for ModelValidationError {}

/// Renders an optional identity the way entity dumps show it.
pub(crate) fn display_id(id: Option<i64>) -> String {
    id.map_or_else(|| "null".to_string(), |value| value.to_string())
}
