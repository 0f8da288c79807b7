//! Core persistence logic for the addressbook demo.
//! This crate owns the schema, the unit of work and every query path.

pub mod app;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use app::{bootstrap, run_app, AppError};
pub use config::{AppConfig, ConfigError};
pub use logging::{default_log_level, flush_logging, init_logging, logging_status};
pub use model::address::{addresses_from_city_list, Address, AddressId};
pub use model::person::{Person, PersonId};
pub use model::ModelValidationError;
pub use repo::person_repo::{MyRepository, PersonRepository, SqlitePersonRepository, MISO_NAME};
pub use repo::session::Session;
pub use repo::{EntityKey, RepoError, RepoResult};
pub use service::startup::{
    run_startup, seed_startup_data, StartupError, StartupReport, SEED_CITIES, SEED_PERSON_NAME,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
