use addressbook_core::db::{in_unit_of_work, open_db_in_memory};
use addressbook_core::{
    Address, EntityKey, Person, PersonRepository, RepoError, Session, SqlitePersonRepository,
};
use rusqlite::Connection;

#[test]
fn persist_assigns_identities_and_tracks_entities() {
    let conn = open_db_in_memory().unwrap();
    let session = Session::try_new(&conn).unwrap();

    let mut nitra = Address::new("Nitra");
    let mut sala = Address::new("Sala");
    let nitra_id = session.persist_address(&mut nitra).unwrap();
    let sala_id = session.persist_address(&mut sala).unwrap();
    assert_eq!(nitra.id, Some(nitra_id));
    assert_ne!(nitra_id, sala_id);

    let mut person = Person::new("Miso", [nitra, sala]);
    let person_id = session.persist_person(&mut person).unwrap();

    assert!(session.is_managed(EntityKey::Person(person_id)));
    assert!(session.is_managed(EntityKey::Address(nitra_id)));
    assert!(session.is_managed(EntityKey::Address(sala_id)));
    assert_eq!(session.managed_count(), 3);
}

#[test]
fn select_all_persons_loads_relationship_and_tracks_loaded_rows() {
    let conn = open_db_in_memory().unwrap();
    let person_id = {
        let writer = Session::try_new(&conn).unwrap();
        let mut address = Address::new("Komarom");
        writer.persist_address(&mut address).unwrap();
        let mut person = Person::new("Miso", [address]);
        writer.persist_person(&mut person).unwrap()
    };

    let reader = Session::try_new(&conn).unwrap();
    assert!(!reader.is_managed(EntityKey::Person(person_id)));

    let persons = reader.select_all_persons().unwrap();
    assert_eq!(persons.len(), 1);
    assert_eq!(persons[0].id, Some(person_id));
    assert_eq!(persons[0].cities().into_iter().collect::<Vec<_>>(), vec!["Komarom"]);
    assert!(reader.is_managed(EntityKey::Person(person_id)));
    assert_eq!(reader.managed_count(), 2);
}

#[test]
fn persist_rejects_entities_that_already_have_identity() {
    let conn = open_db_in_memory().unwrap();
    let session = Session::try_new(&conn).unwrap();

    let mut address = Address::new("Nitra");
    let id = session.persist_address(&mut address).unwrap();
    let err = session.persist_address(&mut address).unwrap_err();
    assert!(matches!(err, RepoError::DetachedEntity(EntityKey::Address(key)) if key == id));

    let mut person = Person::new("Miso", []);
    person.id = Some(7);
    let err = session.persist_person(&mut person).unwrap_err();
    assert!(matches!(err, RepoError::DetachedEntity(EntityKey::Person(7))));
}

#[test]
fn persist_person_rejects_unsaved_address() {
    let conn = open_db_in_memory().unwrap();
    let session = Session::try_new(&conn).unwrap();

    let mut person = Person::new("Miso", [Address::new("Sala")]);
    let err = session.persist_person(&mut person).unwrap_err();

    assert!(matches!(err, RepoError::TransientReference { ref city } if city == "Sala"));
    assert_eq!(session.managed_count(), 0);
}

#[test]
fn persist_address_rejects_blank_city() {
    let conn = open_db_in_memory().unwrap();
    let session = Session::try_new(&conn).unwrap();

    let mut address = Address::new(" ");
    let err = session.persist_address(&mut address).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));
    assert_eq!(address.id, None);
}

#[test]
fn unit_of_work_commits_on_success() {
    let mut conn = open_db_in_memory().unwrap();

    let person_id = in_unit_of_work(&mut conn, |tx| -> Result<i64, RepoError> {
        let session = Session::try_new(tx)?;
        let mut address = Address::new("Nitra");
        session.persist_address(&mut address)?;
        let mut person = Person::new("Miso", [address]);
        session.persist_person(&mut person)
    })
    .unwrap();

    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    assert!(repo.exists_by_id(person_id).unwrap());
    assert_eq!(row_count(&conn, "address"), 1);
}

#[test]
fn unit_of_work_rolls_back_every_write_on_error() {
    let mut conn = open_db_in_memory().unwrap();

    let result = in_unit_of_work(&mut conn, |tx| -> Result<(), RepoError> {
        let session = Session::try_new(tx)?;
        let mut address = Address::new("Nitra");
        session.persist_address(&mut address)?;
        let mut person = Person::new("Miso", [address]);
        session.persist_person(&mut person)?;

        let repo = SqlitePersonRepository::try_new(tx)?;
        assert_eq!(repo.count()?, 1);
        Err(RepoError::InvalidData("abort requested".to_string()))
    });

    assert!(matches!(result, Err(RepoError::InvalidData(_))));
    assert_eq!(row_count(&conn, "person"), 0);
    assert_eq!(row_count(&conn, "address"), 0);
    assert_eq!(row_count(&conn, "person_address"), 0);
}

#[test]
fn failed_person_insert_inside_unit_of_work_keeps_earlier_writes_until_outcome() {
    let mut conn = open_db_in_memory().unwrap();

    let outcome = in_unit_of_work(&mut conn, |tx| -> Result<usize, RepoError> {
        let session = Session::try_new(tx)?;
        let mut address = Address::new("Nitra");
        session.persist_address(&mut address)?;

        let mut dangling = Person::new("Miso", [Address::with_id(99, "Ghost")]);
        let err = session.persist_person(&mut dangling).unwrap_err();
        assert!(matches!(err, RepoError::ConstraintViolation(_)));

        let persons: i64 = tx.query_row("SELECT COUNT(*) FROM person;", [], |row| row.get(0))?;
        Ok(persons as usize)
    })
    .unwrap();

    assert_eq!(outcome, 0);
    assert_eq!(row_count(&conn, "address"), 1);
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
