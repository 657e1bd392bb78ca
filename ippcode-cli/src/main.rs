//! IPPcode22 interpreter.
//!
//! Exit codes:
//! - 0: Program completed
//! - 0-49: Value passed to EXIT
//! - 10: Invalid arguments
//! - 11: Source or input file cannot be read
//! - 12: Output cannot be written
//! - 31, 32: Malformed program document
//! - 52-58: Semantic and runtime errors

mod commands;
mod config;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use config::{Cli, RunConfig};
use ippcode_common::ErrorKind;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            let _ = e.print();
            process::exit(0);
        }
        Err(e) => {
            let message = e.to_string();
            let detail = message
                .lines()
                .next()
                .unwrap_or_default()
                .trim_start_matches("error: ");
            process::exit(commands::report(ErrorKind::Argument, detail));
        }
    };

    let config = match RunConfig::from_cli(cli) {
        Ok(config) => config,
        Err(e) => process::exit(commands::report(e.kind(), e)),
    };

    match commands::run(&config) {
        Ok(termination) => process::exit(termination.exit_code()),
        Err(code) => process::exit(code),
    }
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("IPPCODE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}
