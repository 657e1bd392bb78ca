//! Command-line arguments and the run configuration built from them.

use clap::Parser;
use ippcode_common::ErrorKind;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "ippcode", version)]
#[command(about = "Interpreter for IPPcode22 programs in XML form", long_about = None)]
#[command(after_help = "At least one of --source and --input is required; \
the other is read from standard input.")]
pub struct Cli {
    /// Program XML file (standard input when omitted)
    #[arg(long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Input file for READ (standard input when omitted)
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

/// Where a stream comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stream {
    Stdin,
    File(PathBuf),
}

impl Stream {
    fn from_arg(path: Option<PathBuf>) -> Self {
        path.map_or(Stream::Stdin, Stream::File)
    }
}

/// Resolved program source and input source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub source: Stream,
    pub input: Stream,
}

/// Invalid argument combinations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("at least one of --source and --input is required")]
    NoFiles,

    #[error("--source and --input both name '{0}'")]
    SameFile(PathBuf),
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Argument
    }
}

impl RunConfig {
    /// Check the argument combination.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        if let (Some(source), Some(input)) = (&cli.source, &cli.input) {
            if same_file(source, input) {
                return Err(ConfigError::SameFile(source.clone()));
            }
        }
        if cli.source.is_none() && cli.input.is_none() {
            return Err(ConfigError::NoFiles);
        }
        Ok(Self {
            source: Stream::from_arg(cli.source),
            input: Stream::from_arg(cli.input),
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
