use addressbook_core::{bootstrap, flush_logging, logging_status, run_app, AppConfig, AppError};
use std::path::Path;

#[test]
fn bootstrap_wires_logging_and_a_fresh_store() {
    let log_dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        log_level: "debug",
        log_dir: Some(log_dir.path().to_path_buf()),
        show_sql: true,
    };

    let report = run_app(&config, &mut Vec::new()).unwrap();
    assert_eq!(report.all.len(), 1);

    let (level, dir) = logging_status().unwrap();
    assert_eq!(level, "debug");
    assert_eq!(dir.as_deref(), Some(log_dir.path()));

    let second = bootstrap(&config).unwrap();
    let persons: i64 = second
        .query_row("SELECT COUNT(*) FROM person;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(persons, 0);

    flush_logging();
    let logged = read_logs(log_dir.path());
    assert!(logged
        .lines()
        .any(|line| line.contains("event=schema_ddl") && line.contains("CREATE TABLE")));
    assert!(logged
        .lines()
        .any(|line| line.contains("event=sql") && line.contains("INSERT INTO person (name)")));

    let conflicting = AppConfig {
        log_level: "info",
        ..config
    };
    let err = run_app(&conflicting, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, AppError::Logging(_)));
}

fn read_logs(dir: &Path) -> String {
    let mut logged = String::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_file() {
            logged.push_str(&std::fs::read_to_string(path).unwrap());
        }
    }
    logged
}
