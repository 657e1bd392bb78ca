//! Running a configured program and reporting failures.

use crate::config::{RunConfig, Stream};
use ippcode_common::{ErrorKind, Program};
use ippcode_vm::{InputSource, LineInput, Termination};
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use tracing::debug;

/// Print the single diagnostic line for a fatal error and return its exit
/// code.
pub fn report(kind: ErrorKind, detail: impl Display) -> i32 {
    // Nothing more can be done if standard error itself is gone.
    let _ = writeln!(io::stderr(), "{}: {detail}", kind.category());
    kind.exit_code()
}

/// Load and execute the configured program.
///
/// Returns how the program terminated, or the exit code of the fatal error
/// that was already reported.
pub fn run(config: &RunConfig) -> Result<Termination, i32> {
    let program = load_program(&config.source)?;
    let mut input = open_input(&config.input)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut diag = io::stderr();

    let result = ippcode_vm::run(&program, input.as_mut(), &mut out, &mut diag);
    let flushed = out.flush();

    match result {
        Ok(termination) => {
            flushed.map_err(|e| report(ErrorKind::OutputAccess, format!("standard output: {e}")))?;
            debug!(?termination, "finished");
            Ok(termination)
        }
        Err(e) => Err(report(e.kind(), e)),
    }
}

fn load_program(source: &Stream) -> Result<Program, i32> {
    let xml = match source {
        Stream::File(path) => fs::read_to_string(path).map_err(|e| {
            report(
                ErrorKind::InputAccess,
                format!("cannot read '{}': {e}", path.display()),
            )
        })?,
        Stream::Stdin => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map_err(|e| {
                report(ErrorKind::InputAccess, format!("cannot read standard input: {e}"))
            })?;
            text
        }
    };

    ippcode_loader::load(&xml).map_err(|e| report(e.kind(), e))
}

fn open_input(input: &Stream) -> Result<Box<dyn InputSource>, i32> {
    match input {
        Stream::File(path) => {
            let file = File::open(path).map_err(|e| {
                report(
                    ErrorKind::InputAccess,
                    format!("cannot open '{}': {e}", path.display()),
                )
            })?;
            Ok(Box::new(LineInput::new(BufReader::new(file))))
        }
        Stream::Stdin => Ok(Box::new(LineInput::new(io::stdin().lock()))),
    }
}
