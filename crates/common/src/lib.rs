//! IPPcode22 common types.
//!
//! This crate provides the foundational data structures shared by the
//! loader, the virtual machine and the command-line front end:
//!
//! - [`Opcode`]: the 35 opcodes and their operand signatures
//! - [`TypeTag`]: the value types `int`, `bool`, `string`, `nil`
//! - [`Value`]: runtime value representation
//! - [`Instruction`], [`Operand`], [`VarRef`], [`Frame`]: decoded instructions
//! - [`Program`]: instructions in execution order plus a label table
//! - [`ErrorKind`]: the fatal error taxonomy and its exit codes
//!
//! # Dependencies
//!
//! This crate uses `thiserror` (compile-time proc-macro, zero runtime cost)
//! and has no other dependencies.

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod type_tag;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::{ErrorKind, ProgramError};
pub use instruction::{Frame, Instruction, Operand, VarRef};
pub use opcode::{OperandKind, Opcode};
pub use program::Program;
pub use type_tag::TypeTag;
pub use value::Value;
