//! Persistence context over one connection or transaction.
//!
//! # Responsibility
//! - Persist transient entities and assign their generated identities.
//! - Track every entity persisted or loaded through this session.
//! - Run the raw select-all query over persons.
//!
//! # Invariants
//! - `persist_*` only accepts transient entities.
//! - Addresses must be persisted before a person referencing them.

use crate::model::address::{Address, AddressId};
use crate::model::person::{Person, PersonId};
use crate::repo::person_repo::{insert_person, load_persons};
use crate::repo::{ensure_connection_ready, EntityKey, RepoError, RepoResult};
use log::debug;
use rusqlite::Connection;
use std::cell::RefCell;
use std::collections::BTreeSet;

const SELECT_ALL_PERSONS_SQL: &str = "SELECT p.id, p.name FROM person p;";

/// Unit-of-work scoped persistence context.
///
/// Usually built over the transaction handed out by
/// [`crate::db::in_unit_of_work`], so that everything persisted through it
/// commits or rolls back together.
pub struct Session<'conn> {
    conn: &'conn Connection,
    managed: RefCell<BTreeSet<EntityKey>>,
}

impl<'conn> Session<'conn> {
    /// Opens a session over a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self {
            conn,
            managed: RefCell::new(BTreeSet::new()),
        })
    }

    /// Inserts a transient address and writes the generated id back.
    pub fn persist_address(&self, address: &mut Address) -> RepoResult<AddressId> {
        if let Some(id) = address.id {
            return Err(RepoError::DetachedEntity(EntityKey::Address(id)));
        }
        address.validate()?;

        self.conn.execute(
            "INSERT INTO address (city) VALUES (?1);",
            [address.city.as_str()],
        )?;
        let id = self.conn.last_insert_rowid();
        address.id = Some(id);
        self.track(EntityKey::Address(id));
        debug!("event=persist module=session entity=address id={id}");
        Ok(id)
    }

    /// Inserts a transient person with its relationship rows.
    ///
    /// # Errors
    /// - `TransientReference` when an owned address has no identity yet.
    /// - `ConstraintViolation` when an owned address does not exist in
    ///   storage or already belongs to another person.
    pub fn persist_person(&self, person: &mut Person) -> RepoResult<PersonId> {
        if let Some(id) = person.id {
            return Err(RepoError::DetachedEntity(EntityKey::Person(id)));
        }

        let id = insert_person(self.conn, person)?;
        self.track_person(person);
        debug!(
            "event=persist module=session entity=person id={id} address_count={}",
            person.addresses.len()
        );
        Ok(id)
    }

    /// Runs the raw select-all query over persons, relationship included.
    pub fn select_all_persons(&self) -> RepoResult<Vec<Person>> {
        let persons = load_persons(self.conn, SELECT_ALL_PERSONS_SQL, [])?;
        persons.iter().for_each(|person| self.track_person(person));
        Ok(persons)
    }

    /// Returns whether `key` was persisted or loaded through this session.
    pub fn is_managed(&self, key: EntityKey) -> bool {
        self.managed.borrow().contains(&key)
    }

    /// Number of entities tracked by this session.
    pub fn managed_count(&self) -> usize {
        self.managed.borrow().len()
    }

    fn track_person(&self, person: &Person) {
        if let Some(id) = person.id {
            self.track(EntityKey::Person(id));
        }
        for address_id in person.addresses.iter().filter_map(|address| address.id) {
            self.track(EntityKey::Address(address_id));
        }
    }

    fn track(&self, key: EntityKey) {
        self.managed.borrow_mut().insert(key);
    }
}
