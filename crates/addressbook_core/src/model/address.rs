//! Address entity.
//!
//! # Invariants
//! - `city` is never blank.
//! - Two addresses are equal when both identity and city are equal.

use super::{display_id, ModelValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Surrogate key assigned by storage on insert.
pub type AddressId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    /// `None` until the address has been persisted.
    pub id: Option<AddressId>,
    pub city: String,
}

impl Address {
    /// Creates a transient address.
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            id: None,
            city: city.into(),
        }
    }

    /// Creates an address with a known identity, e.g. when hydrating rows.
    pub fn with_id(id: AddressId, city: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            city: city.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.city.trim().is_empty() {
            return Err(ModelValidationError::BlankCity);
        }
        Ok(())
    }

    /// Returns whether this address has not been persisted yet.
    pub fn is_transient(&self) -> bool {
        self.id.is_none()
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Address(id={}, city={})", display_id(self.id), self.city)
    }
}

/// Builds a set of transient addresses from a comma-separated city list.
///
/// Entries are trimmed; empty entries are skipped and duplicates collapse.
pub fn addresses_from_city_list(cities: &str) -> BTreeSet<Address> {
    cities
        .split(',')
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .map(Address::new)
        .collect()
}
