//! Runtime errors for the IPPcode22 VM.
//!
//! Every error includes the execution position (`at`) of the instruction
//! that raised it. All of them are fatal.

use crate::frames::FrameError;
use ippcode_common::{ErrorKind, Frame, Opcode, VarRef};
use thiserror::Error;

/// Errors that occur during program execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// JUMP, CALL or a conditional jump names a label that was never declared.
    #[error("undefined label '{label}' at instruction {at}")]
    UndefinedLabel { at: usize, label: String },

    /// DEFVAR of a name that already exists in the frame.
    #[error("variable {var} redeclared at instruction {at}")]
    Redeclaration { at: usize, var: VarRef },

    /// Reference to a variable not declared in its frame.
    #[error("undefined variable {var} at instruction {at}")]
    UndefinedVariable { at: usize, var: VarRef },

    /// LF with an empty local stack, or TF with no temporary frame.
    #[error("frame {frame} does not exist at instruction {at}")]
    UndefinedFrame { at: usize, frame: Frame },

    /// Read of a variable that was never written.
    #[error("variable {var} is uninitialized at instruction {at}")]
    UninitializedVariable { at: usize, var: VarRef },

    /// RETURN with no saved return position.
    #[error("RETURN with empty call stack at instruction {at}")]
    EmptyCallStack { at: usize },

    /// POPS with an empty data stack.
    #[error("POPS with empty data stack at instruction {at}")]
    EmptyDataStack { at: usize },

    /// Operand types do not satisfy the operator.
    #[error("{opcode} cannot take operands of type {found} at instruction {at}")]
    OperandType {
        at: usize,
        opcode: Opcode,
        found: String,
    },

    /// IDIV with a zero divisor.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    /// EXIT with a code outside `0..=49`.
    #[error("exit code {code} out of range 0-49 at instruction {at}")]
    ExitCodeOutOfRange { at: usize, code: i64 },

    /// INT2CHAR with a value that is not a Unicode scalar value.
    #[error("{value} is not a valid code point at instruction {at}")]
    InvalidCodePoint { at: usize, value: i64 },

    /// String position outside `0..length`.
    #[error("string index {index} out of range (length {length}) at instruction {at}")]
    StringIndexOutOfRange { at: usize, index: i64, length: usize },

    /// SETCHAR with an empty replacement string.
    #[error("SETCHAR with empty replacement string at instruction {at}")]
    EmptyReplacement { at: usize },

    /// An operand does not have the shape its opcode requires.
    #[error("malformed {opcode} instruction at {at}")]
    MalformedInstruction { at: usize, opcode: Opcode },

    /// The input source failed.
    #[error("cannot read input at instruction {at}: {message}")]
    InputAccess { at: usize, message: String },

    /// Standard output or standard error failed.
    #[error("cannot write output at instruction {at}: {message}")]
    OutputAccess { at: usize, message: String },
}

impl RuntimeError {
    /// The error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::UndefinedLabel { .. } | RuntimeError::Redeclaration { .. } => {
                ErrorKind::Semantic
            }
            RuntimeError::OperandType { .. } => ErrorKind::OperandType,
            RuntimeError::UndefinedVariable { .. } => ErrorKind::UndefinedVariable,
            RuntimeError::UndefinedFrame { .. } => ErrorKind::UndefinedFrame,
            RuntimeError::UninitializedVariable { .. }
            | RuntimeError::EmptyCallStack { .. }
            | RuntimeError::EmptyDataStack { .. } => ErrorKind::MissingValue,
            RuntimeError::DivisionByZero { .. } | RuntimeError::ExitCodeOutOfRange { .. } => {
                ErrorKind::InvalidOperandValue
            }
            RuntimeError::InvalidCodePoint { .. }
            | RuntimeError::StringIndexOutOfRange { .. }
            | RuntimeError::EmptyReplacement { .. } => ErrorKind::InvalidStringOperation,
            RuntimeError::MalformedInstruction { .. } => ErrorKind::UnexpectedStructure,
            RuntimeError::InputAccess { .. } => ErrorKind::InputAccess,
            RuntimeError::OutputAccess { .. } => ErrorKind::OutputAccess,
        }
    }

    /// Position of the failing instruction.
    pub fn at(&self) -> usize {
        match self {
            RuntimeError::UndefinedLabel { at, .. }
            | RuntimeError::Redeclaration { at, .. }
            | RuntimeError::UndefinedVariable { at, .. }
            | RuntimeError::UndefinedFrame { at, .. }
            | RuntimeError::UninitializedVariable { at, .. }
            | RuntimeError::EmptyCallStack { at }
            | RuntimeError::EmptyDataStack { at }
            | RuntimeError::OperandType { at, .. }
            | RuntimeError::DivisionByZero { at }
            | RuntimeError::ExitCodeOutOfRange { at, .. }
            | RuntimeError::InvalidCodePoint { at, .. }
            | RuntimeError::StringIndexOutOfRange { at, .. }
            | RuntimeError::EmptyReplacement { at }
            | RuntimeError::MalformedInstruction { at, .. }
            | RuntimeError::InputAccess { at, .. }
            | RuntimeError::OutputAccess { at, .. } => *at,
        }
    }
}

impl FrameError {
    /// Attach the position of the instruction that failed.
    pub fn at(self, at: usize) -> RuntimeError {
        match self {
            FrameError::Redeclared(var) => RuntimeError::Redeclaration { at, var },
            FrameError::UndefinedVariable(var) => RuntimeError::UndefinedVariable { at, var },
            FrameError::UndefinedFrame(frame) => RuntimeError::UndefinedFrame { at, frame },
            FrameError::Uninitialized(var) => RuntimeError::UninitializedVariable { at, var },
        }
    }
}
