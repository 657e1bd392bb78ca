//! Error taxonomy shared by every stage of the interpreter.
//!
//! Each failure anywhere in the pipeline maps onto exactly one [`ErrorKind`],
//! and each kind onto one process exit code.

use crate::opcode::{OperandKind, Opcode};
use thiserror::Error;

/// The closed set of fatal error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid command-line invocation.
    Argument,
    /// The program source or the input source could not be read.
    InputAccess,
    /// Standard output or standard error could not be written.
    OutputAccess,
    /// The program document is not well-formed XML.
    MalformedProgram,
    /// Well-formed XML with an invalid instruction or operand shape.
    UnexpectedStructure,
    /// Duplicate or unresolved label, or a variable declared twice.
    Semantic,
    /// An operand's type does not satisfy the operator.
    OperandType,
    /// A variable is not declared in the addressed frame.
    UndefinedVariable,
    /// The addressed local or temporary frame does not exist.
    UndefinedFrame,
    /// Read of an uninitialized variable, or pop from an empty stack.
    MissingValue,
    /// A value is outside its permitted range.
    InvalidOperandValue,
    /// Out-of-bounds or otherwise invalid string operation.
    InvalidStringOperation,
}

impl ErrorKind {
    /// The process exit code for this kind.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Argument => 10,
            ErrorKind::InputAccess => 11,
            ErrorKind::OutputAccess => 12,
            ErrorKind::MalformedProgram => 31,
            ErrorKind::UnexpectedStructure => 32,
            ErrorKind::Semantic => 52,
            ErrorKind::OperandType => 53,
            ErrorKind::UndefinedVariable => 54,
            ErrorKind::UndefinedFrame => 55,
            ErrorKind::MissingValue => 56,
            ErrorKind::InvalidOperandValue => 57,
            ErrorKind::InvalidStringOperation => 58,
        }
    }

    /// Short category label printed in front of every diagnostic.
    pub fn category(&self) -> &'static str {
        match self {
            ErrorKind::Argument => "argument error",
            ErrorKind::InputAccess => "input error",
            ErrorKind::OutputAccess => "output error",
            ErrorKind::MalformedProgram => "malformed program",
            ErrorKind::UnexpectedStructure => "unexpected program structure",
            ErrorKind::Semantic => "semantic error",
            ErrorKind::OperandType => "runtime error: wrong operand type",
            ErrorKind::UndefinedVariable => "runtime error: undefined variable",
            ErrorKind::UndefinedFrame => "runtime error: undefined frame",
            ErrorKind::MissingValue => "runtime error: missing value",
            ErrorKind::InvalidOperandValue => "runtime error: invalid operand value",
            ErrorKind::InvalidStringOperation => "runtime error: invalid string operation",
        }
    }
}

/// Errors raised while assembling a [`Program`](crate::Program) from
/// instructions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// An instruction has the wrong number of operands.
    #[error("{opcode} at position {at} expects {expected} operand(s), found {found}")]
    Arity {
        at: usize,
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    /// An operand does not fit its slot.
    #[error("{opcode} at position {at}: operand {slot} must be a {expected}")]
    OperandKind {
        at: usize,
        opcode: Opcode,
        slot: usize,
        expected: &'static str,
    },

    /// Two `LABEL` instructions declare the same name.
    #[error("label '{label}' redefined at position {at} (first defined at {first})")]
    DuplicateLabel {
        at: usize,
        first: usize,
        label: String,
    },
}

impl ProgramError {
    /// The error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProgramError::Arity { .. } | ProgramError::OperandKind { .. } => {
                ErrorKind::UnexpectedStructure
            }
            ProgramError::DuplicateLabel { .. } => ErrorKind::Semantic,
        }
    }

    pub(crate) fn operand_kind(at: usize, opcode: Opcode, slot: usize, kind: OperandKind) -> Self {
        ProgramError::OperandKind {
            at,
            opcode,
            slot,
            expected: kind.name(),
        }
    }
}
