//! One-shot startup routine.
//!
//! # Responsibility
//! - Seed three addresses and one person owning all of them.
//! - Read the person back through every query path and print each result.
//!
//! # Invariants
//! - Seeding and all reads run inside one unit of work.
//! - Any failure rolls back every write of the run.

use crate::db::in_unit_of_work;
use crate::model::address::addresses_from_city_list;
use crate::model::person::Person;
use crate::repo::person_repo::{MyRepository, PersonRepository, SqlitePersonRepository};
use crate::repo::session::Session;
use crate::repo::{RepoError, RepoResult};
use log::info;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use std::time::Instant;

/// Cities seeded by the startup routine.
pub const SEED_CITIES: &str = "Nitra,Sala,Komarom";
/// Name of the person seeded by the startup routine.
pub const SEED_PERSON_NAME: &str = "Miso";

/// Error for the startup use-case.
#[derive(Debug)]
pub enum StartupError {
    Repo(RepoError),
    Output(std::io::Error),
}

impl Display for StartupError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "startup routine failed: {err}"),
            Self::Output(err) => write!(f, "failed to write startup output: {err}"),
        }
    }
}

impl Error for StartupError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<RepoError> for StartupError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<rusqlite::Error> for StartupError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

impl From<std::io::Error> for StartupError {
    fn from(value: std::io::Error) -> Self {
        Self::Output(value)
    }
}

/// Results of every read issued by [`run_startup`], in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupReport {
    pub selected: Vec<Person>,
    pub all: Vec<Person>,
    pub by_name: Vec<Person>,
    pub misos: Person,
    pub person_miso: Person,
}

/// Persists the seed addresses and the seed person owning them.
///
/// Returns the persisted person with identities assigned.
pub fn seed_startup_data(session: &Session<'_>) -> RepoResult<Person> {
    let mut addresses = addresses_from_city_list(SEED_CITIES)
        .into_iter()
        .collect::<Vec<_>>();
    for address in &mut addresses {
        session.persist_address(address)?;
    }

    let mut person = Person::new(SEED_PERSON_NAME, addresses);
    session.persist_person(&mut person)?;
    Ok(person)
}

/// Runs the startup routine in one unit of work, printing to `out`.
///
/// # Errors
/// - Any persistence or single-result failure aborts the run and rolls back.
pub fn run_startup<W: Write>(
    conn: &mut Connection,
    out: &mut W,
) -> Result<StartupReport, StartupError> {
    let started_at = Instant::now();
    info!("event=startup module=service status=start");

    let report = in_unit_of_work(conn, |tx| -> Result<StartupReport, StartupError> {
        let session = Session::try_new(tx)?;
        let repo = SqlitePersonRepository::try_new(tx)?;

        seed_startup_data(&session)?;

        let selected = session.select_all_persons()?;
        writeln!(out, "{}", render_list(&selected))?;

        let all = repo.find_all()?;
        writeln!(out, "{}", render_list(&all))?;

        writeln!(out, "findAllByName:")?;
        let by_name = repo.find_all_by_name(SEED_PERSON_NAME)?;
        writeln!(out, "{}", render_list(&by_name))?;

        writeln!(out, "findAllMisos")?;
        let misos = repo.find_all_misos()?;
        writeln!(out, "{misos}")?;

        writeln!(out, "findPersonMiso")?;
        let person_miso = repo.find_person_miso()?;
        writeln!(out, "{person_miso}")?;

        Ok(StartupReport {
            selected,
            all,
            by_name,
            misos,
            person_miso,
        })
    })?;

    info!(
        "event=startup module=service status=ok person_count={} duration_ms={}",
        report.all.len(),
        started_at.elapsed().as_millis()
    );
    Ok(report)
}

fn render_list(persons: &[Person]) -> String {
    let items = persons
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{items}]")
}
