//! IPPcode22 virtual machine: executes a validated [`Program`].
//!
//! The machine has:
//! - A variable store with a global frame, a stack of local frames and an
//!   optional temporary frame
//! - A call stack of return positions
//! - A data stack of values for `PUSHS`/`POPS`
//!
//! Input for `READ` comes from an [`InputSource`]. `WRITE` goes to the
//! `out` sink; `DPRINT` and `BREAK` go to the `diag` sink.
//!
//! # Usage
//!
//! ```
//! use ippcode_common::{Frame, Instruction, Opcode, Operand, Program, Value, VarRef};
//! use ippcode_vm::{run, LineInput, Termination};
//!
//! let x = VarRef::new(Frame::Global, "x");
//! let program = Program::new(vec![
//!     Instruction::new(Opcode::DefVar, vec![Operand::Var(x.clone())]),
//!     Instruction::new(
//!         Opcode::Add,
//!         vec![
//!             Operand::Var(x.clone()),
//!             Operand::Literal(Value::Int(40)),
//!             Operand::Literal(Value::Int(2)),
//!         ],
//!     ),
//!     Instruction::new(Opcode::Write, vec![Operand::Var(x)]),
//! ])
//! .unwrap();
//!
//! let mut input = LineInput::new(std::io::empty());
//! let mut out = Vec::new();
//! let mut diag = Vec::new();
//! let done = run(&program, &mut input, &mut out, &mut diag).unwrap();
//! assert_eq!(done, Termination::Completed);
//! assert_eq!(out, b"42");
//! ```

pub mod error;
pub mod execute;
pub mod frames;
pub mod input;
pub mod machine;

pub use error::RuntimeError;
pub use frames::{FrameError, Frames, Variable};
pub use input::{InputSource, LineInput};
pub use machine::{Termination, VM};

use ippcode_common::Program;
use std::io::Write;

/// Execute a program to completion.
///
/// Output already written to `out` or `diag` stays there when an error is
/// returned.
///
/// # Errors
///
/// Returns [`RuntimeError`] for the first fatal condition (undefined
/// variable, operand type mismatch, division by zero, etc.).
pub fn run(
    program: &Program,
    input: &mut dyn InputSource,
    out: &mut dyn Write,
    diag: &mut dyn Write,
) -> Result<Termination, RuntimeError> {
    let mut vm = VM::new(program, input, out, diag);
    vm.execute()
}
