//! Person entity and its owned address set.
//!
//! # Invariants
//! - `name` is never blank.
//! - `addresses` holds each address at most once (value equality).
//! - Every address must be persisted before the owning person is persisted.

use super::address::Address;
use super::{display_id, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Surrogate key assigned by storage on insert.
pub type PersonId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// `None` until the person has been persisted.
    pub id: Option<PersonId>,
    pub name: String,
    /// One-to-many relationship, always loaded together with the person.
    pub addresses: BTreeSet<Address>,
}

impl Person {
    /// Creates a transient person owning `addresses`.
    pub fn new(name: impl Into<String>, addresses: impl IntoIterator<Item = Address>) -> Self {
        Self {
            id: None,
            name: name.into(),
            addresses: addresses.into_iter().collect(),
        }
    }

    /// Validates the person and every owned address.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.name.trim().is_empty() {
            return Err(ModelValidationError::BlankName);
        }
        self.addresses.iter().try_for_each(Address::validate)
    }

    /// Returns the set of city names across owned addresses.
    pub fn cities(&self) -> BTreeSet<&str> {
        self.addresses
            .iter()
            .map(|address| address.city.as_str())
            .collect()
    }
}

impl Display for Person {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Person(id={}, name={}, addresses=[",
            display_id(self.id),
            self.name
        )?;
        for (index, address) in self.addresses.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{address}")?;
        }
        write!(f, "])")
    }
}
