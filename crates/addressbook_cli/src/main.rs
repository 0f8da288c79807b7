//! Startup-routine entry point.
//!
//! # Responsibility
//! - Wire configuration, logging and storage, then run the startup routine.
//! - Map failures to a non-zero exit status with the full error chain.
//!
//! # Invariants
//! - The exit event is logged before buffered log output is flushed.

use addressbook_core::{core_version, flush_logging, run_app, AppConfig, AppError, ConfigError};
use log::{error, info};
use std::error::Error;
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let stdout = io::stdout();
    let outcome = run(AppConfig::from_env, &mut stdout.lock());
    finish(outcome, &mut io::stderr().lock())
}

fn run<C, W>(load_config: C, out: &mut W) -> Result<(), AppError>
where
    C: FnOnce() -> Result<AppConfig, ConfigError>,
    W: Write,
{
    let config = load_config()?;
    info!(
        "event=app_run module=cli status=start version={}",
        core_version()
    );
    run_app(&config, out)?;
    Ok(())
}

fn finish<E: Write>(outcome: Result<(), AppError>, stderr: &mut E) -> ExitCode {
    let code = match outcome {
        Ok(()) => {
            info!("event=app_exit module=cli status=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=app_exit module=cli status=error error={err}");
            let _ = writeln!(stderr, "error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                let _ = writeln!(stderr, "  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    };
    flush_logging();
    code
}
