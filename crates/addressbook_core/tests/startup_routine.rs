use addressbook_core::db::open_db_in_memory;
use addressbook_core::{
    run_startup, seed_startup_data, PersonRepository, RepoError, Session, SqlitePersonRepository,
    StartupError, SEED_PERSON_NAME,
};
use rusqlite::Connection;
use std::collections::BTreeSet;

#[test]
fn startup_seeds_one_person_with_three_addresses() {
    let mut conn = open_db_in_memory().unwrap();
    let mut out = Vec::new();

    let report = run_startup(&mut conn, &mut out).unwrap();

    assert_eq!(report.all.len(), 1);
    let person = &report.all[0];
    assert_eq!(person.name, SEED_PERSON_NAME);
    assert_eq!(
        person.cities(),
        BTreeSet::from(["Nitra", "Sala", "Komarom"])
    );
    assert!(person.addresses.iter().all(|address| address.id.is_some()));
}

#[test]
fn every_query_path_returns_the_same_person() {
    let mut conn = open_db_in_memory().unwrap();
    let mut out = Vec::new();

    let report = run_startup(&mut conn, &mut out).unwrap();
    let person = report.all[0].clone();

    assert_eq!(report.selected, vec![person.clone()]);
    assert_eq!(report.by_name, vec![person.clone()]);
    assert_eq!(report.misos, person);
    assert_eq!(report.person_miso, person);
}

#[test]
fn startup_output_lists_each_step_in_order() {
    let mut conn = open_db_in_memory().unwrap();
    let mut out = Vec::new();

    let report = run_startup(&mut conn, &mut out).unwrap();
    let output = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = output.lines().collect();
    let person_line = report.all[0].to_string();
    let list_line = format!("[{person_line}]");

    assert_eq!(
        lines,
        vec![
            list_line.as_str(),
            list_line.as_str(),
            "findAllByName:",
            list_line.as_str(),
            "findAllMisos",
            person_line.as_str(),
            "findPersonMiso",
            person_line.as_str(),
        ]
    );
    assert!(person_line.starts_with("Person(id="));
    assert!(person_line.contains("name=Miso"));
    assert!(person_line.contains("city=Komarom"));
}

#[test]
fn startup_commits_its_unit_of_work() {
    let mut conn = open_db_in_memory().unwrap();
    run_startup(&mut conn, &mut Vec::new()).unwrap();

    let repo = SqlitePersonRepository::try_new(&conn).unwrap();
    assert_eq!(repo.count().unwrap(), 1);
    assert!(repo.find_all_by_name("Nobody").unwrap().is_empty());
    assert_eq!(row_count(&conn, "address"), 3);
    assert_eq!(row_count(&conn, "person_address"), 3);
}

#[test]
fn fresh_stores_yield_identical_row_counts() {
    let counts: Vec<(i64, i64, i64)> = (0..2)
        .map(|_| {
            let mut conn = open_db_in_memory().unwrap();
            run_startup(&mut conn, &mut Vec::new()).unwrap();
            (
                row_count(&conn, "person"),
                row_count(&conn, "address"),
                row_count(&conn, "person_address"),
            )
        })
        .collect();

    assert_eq!(counts[0], (1, 3, 3));
    assert_eq!(counts[0], counts[1]);
}

#[test]
fn second_run_on_same_store_fails_on_duplicate_name_and_rolls_back() {
    let mut conn = open_db_in_memory().unwrap();
    run_startup(&mut conn, &mut Vec::new()).unwrap();

    let err = run_startup(&mut conn, &mut Vec::new()).unwrap_err();
    assert!(matches!(
        err,
        StartupError::Repo(RepoError::IncorrectResultSize {
            expected: 1,
            actual: 2
        })
    ));

    assert_eq!(row_count(&conn, "person"), 1);
    assert_eq!(row_count(&conn, "address"), 3);
    assert_eq!(row_count(&conn, "person_address"), 3);
}

#[test]
fn seed_persists_addresses_before_the_person() {
    let conn = open_db_in_memory().unwrap();
    let session = Session::try_new(&conn).unwrap();

    let person = seed_startup_data(&session).unwrap();

    assert!(person.id.is_some());
    let address_ids: Vec<i64> = person.addresses.iter().filter_map(|a| a.id).collect();
    assert_eq!(address_ids.len(), 3);
    assert_eq!(session.managed_count(), 4);
}

fn row_count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
