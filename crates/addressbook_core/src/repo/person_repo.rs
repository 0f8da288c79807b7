//! Person repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide generic CRUD over `person` rows plus the name-based queries.
//! - Populate the address relationship right after every person read.
//!
//! # Invariants
//! - Every returned `Person` has its full address set loaded.
//! - Name lookups bind the name as a parameter; no SQL is built from input.
//! - Single-result queries return `IncorrectResultSize` unless exactly one
//!   row matches.
//! - A person and its relationship rows are written atomically.

use crate::db::with_savepoint;
use crate::model::address::Address;
use crate::model::person::{Person, PersonId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Params};
use std::collections::BTreeSet;

/// Name matched by the fixed single-result queries.
pub const MISO_NAME: &str = "Miso";

const PERSON_SELECT_SQL: &str = "SELECT p.id, p.name FROM person p";

const FIND_BY_NAME_SQL: &str = "SELECT p.id, p.name
FROM person p
WHERE p.name = ?1
ORDER BY p.id ASC;";

const ADDRESSES_OF_PERSON_SQL: &str = "SELECT a.id, a.city
FROM person_address pa
INNER JOIN address a ON a.id = pa.address_id
WHERE pa.person_id = ?1
ORDER BY a.id ASC;";

/// Query capabilities over persons.
pub trait PersonRepository {
    /// Inserts a transient person or merges a persistent one.
    ///
    /// Assigns the generated identity to `person.id` on insert.
    fn save(&self, person: &mut Person) -> RepoResult<PersonId>;
    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>>;
    fn exists_by_id(&self, id: PersonId) -> RepoResult<bool>;
    /// Returns every person ordered by identity.
    fn find_all(&self) -> RepoResult<Vec<Person>>;
    fn count(&self) -> RepoResult<u64>;
    /// Deletes one person and its relationship rows; addresses are kept.
    fn delete_by_id(&self, id: PersonId) -> RepoResult<()>;
    /// Returns all persons whose name equals `name` exactly.
    fn find_all_by_name(&self, name: &str) -> RepoResult<Vec<Person>>;

    /// Returns the only person named `name`.
    fn find_one_by_name(&self, name: &str) -> RepoResult<Person> {
        single_result(self.find_all_by_name(name)?)
    }

    /// Returns the only person named [`MISO_NAME`].
    fn find_all_misos(&self) -> RepoResult<Person> {
        self.find_one_by_name(MISO_NAME)
    }
}

/// Extension of [`PersonRepository`] with a hand-written lookup.
pub trait MyRepository: PersonRepository {
    /// Returns the only person named [`MISO_NAME`], executing the statement
    /// directly instead of going through [`PersonRepository::find_all_by_name`].
    fn find_person_miso(&self) -> RepoResult<Person>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn save(&self, person: &mut Person) -> RepoResult<PersonId> {
        match person.id {
            None => insert_person(self.conn, person),
            Some(id) => {
                merge_person(self.conn, id, person)?;
                Ok(id)
            }
        }
    }

    fn find_by_id(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut persons = load_persons(
            self.conn,
            &format!("{PERSON_SELECT_SQL} WHERE p.id = ?1;"),
            [id],
        )?;
        Ok(persons.pop())
    }

    fn exists_by_id(&self, id: PersonId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM person WHERE id = ?1);",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_all(&self) -> RepoResult<Vec<Person>> {
        load_persons(
            self.conn,
            &format!("{PERSON_SELECT_SQL} ORDER BY p.id ASC;"),
            [],
        )
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM person;", [], |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative person count `{count}`")))
    }

    fn delete_by_id(&self, id: PersonId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM person WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn find_all_by_name(&self, name: &str) -> RepoResult<Vec<Person>> {
        load_persons(self.conn, FIND_BY_NAME_SQL, [name])
    }
}

impl MyRepository for SqlitePersonRepository<'_> {
    fn find_person_miso(&self) -> RepoResult<Person> {
        single_result(load_persons(self.conn, FIND_BY_NAME_SQL, [MISO_NAME])?)
    }
}

/// Collapses a query result into its only element.
pub(crate) fn single_result(mut persons: Vec<Person>) -> RepoResult<Person> {
    let actual = persons.len();
    match persons.pop() {
        Some(person) if actual == 1 => Ok(person),
        _ => Err(RepoError::IncorrectResultSize {
            expected: 1,
            actual,
        }),
    }
}

/// Inserts a transient person and its relationship rows atomically.
pub(crate) fn insert_person(conn: &Connection, person: &mut Person) -> RepoResult<PersonId> {
    person.validate()?;
    ensure_addresses_persistent(person)?;

    let id = with_savepoint(conn, "person_insert", || -> RepoResult<PersonId> {
        conn.execute(
            "INSERT INTO person (name) VALUES (?1);",
            [person.name.as_str()],
        )?;
        let id = conn.last_insert_rowid();
        link_addresses(conn, id, &person.addresses)?;
        Ok(id)
    })?;

    person.id = Some(id);
    Ok(id)
}

/// Runs a person-selecting statement and eagerly loads each address set.
///
/// `sql` must select `id` and `name` columns from `person`.
pub(crate) fn load_persons<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> RepoResult<Vec<Person>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut heads = Vec::new();
    while let Some(row) = rows.next()? {
        heads.push((row.get::<_, PersonId>("id")?, row.get::<_, String>("name")?));
    }

    heads
        .into_iter()
        .map(|(id, name)| {
            let person = Person {
                id: Some(id),
                name,
                addresses: load_addresses(conn, id)?,
            };
            person
                .validate()
                .map_err(|err| RepoError::InvalidData(format!("person {id}: {err}")))?;
            Ok(person)
        })
        .collect()
}

fn merge_person(conn: &Connection, id: PersonId, person: &Person) -> RepoResult<()> {
    person.validate()?;
    ensure_addresses_persistent(person)?;

    with_savepoint(conn, "person_merge", || -> RepoResult<()> {
        let changed = conn.execute(
            "UPDATE person SET name = ?2 WHERE id = ?1;",
            params![id, person.name.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        conn.execute("DELETE FROM person_address WHERE person_id = ?1;", [id])?;
        link_addresses(conn, id, &person.addresses)
    })
}

fn ensure_addresses_persistent(person: &Person) -> RepoResult<()> {
    match person.addresses.iter().find(|address| address.is_transient()) {
        Some(address) => Err(RepoError::TransientReference {
            city: address.city.clone(),
        }),
        None => Ok(()),
    }
}

fn link_addresses(
    conn: &Connection,
    person_id: PersonId,
    addresses: &BTreeSet<Address>,
) -> RepoResult<()> {
    let mut stmt =
        conn.prepare("INSERT INTO person_address (person_id, address_id) VALUES (?1, ?2);")?;
    for address in addresses {
        stmt.execute(params![person_id, address.id])?;
    }
    Ok(())
}

fn load_addresses(conn: &Connection, person_id: PersonId) -> RepoResult<BTreeSet<Address>> {
    let mut stmt = conn.prepare(ADDRESSES_OF_PERSON_SQL)?;
    let mut rows = stmt.query([person_id])?;
    let mut addresses = BTreeSet::new();
    while let Some(row) = rows.next()? {
        addresses.insert(Address::with_id(row.get("id")?, row.get::<_, String>("city")?));
    }
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::single_result;
    use crate::model::person::Person;
    use crate::repo::RepoError;

    #[test]
    fn single_result_accepts_exactly_one_row() {
        let person = single_result(vec![Person::new("Miso", [])]).unwrap();
        assert_eq!(person.name, "Miso");
    }

    #[test]
    fn single_result_rejects_empty_and_multiple_rows() {
        let empty = single_result(Vec::new()).unwrap_err();
        assert!(matches!(
            empty,
            RepoError::IncorrectResultSize {
                expected: 1,
                actual: 0
            }
        ));

        let many = single_result(vec![Person::new("Miso", []), Person::new("Miso", [])])
            .unwrap_err();
        assert!(matches!(
            many,
            RepoError::IncorrectResultSize {
                expected: 1,
                actual: 2
            }
        ));
    }
}
