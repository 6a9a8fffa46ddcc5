//! Query document checker.
//!
//! This binary delegates to `query_check::check_cli` for reading and
//! validation, keeping the behaviour testable without spawning a process.
//! Exit codes: 0 when the document is accepted, 1 when it is rejected and 2
//! when it cannot be read or the configuration is invalid.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use query_check::check_cli::{CliArgs, CliError, check, failure_report, render};
use query_check::settings::CheckSettings;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

fn main() -> ExitCode {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %error, "tracing init failed");
    }

    let args = CliArgs::parse();
    match run(&args) {
        Ok(rendered) => {
            write_line(io::stdout().lock(), &rendered);
            ExitCode::SUCCESS
        }
        Err(CliError::Validation { source }) => {
            write_line(io::stdout().lock(), &failure_report(&source));
            ExitCode::from(1)
        }
        Err(error) => {
            write_line(io::stderr().lock(), &error.to_string());
            ExitCode::from(2)
        }
    }
}

fn run(args: &CliArgs) -> Result<String, CliError> {
    let settings = CheckSettings::from_environment()?;
    let validated = check(args, settings.limits())?;
    render(&validated, args.pretty)
}

fn write_line(mut out: impl Write, message: &str) {
    if let Err(err) = writeln!(out, "{message}") {
        drop(err);
    }
}
