//! Error types for the IPPcode22 XML loader.

use ippcode_common::{ErrorKind, ProgramError};
use thiserror::Error;

/// Errors produced while loading a program document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The document is not well-formed XML.
    #[error("line {line}: {message}")]
    MalformedXml { line: u32, message: String },

    /// The root element is wrong or carries unexpected attributes.
    #[error("invalid program element: {reason}")]
    InvalidRoot { reason: String },

    /// An element other than `instruction` appears in the program, or
    /// stray text appears where only elements are allowed.
    #[error("unexpected content '{found}' in {context}")]
    UnexpectedContent { context: String, found: String },

    /// A required attribute is missing.
    #[error("{element} is missing attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },

    /// The `order` attribute is not a positive integer.
    #[error("invalid instruction order '{value}'")]
    InvalidOrder { value: String },

    /// Two instructions share one `order`.
    #[error("instruction order {order} used more than once")]
    DuplicateOrder { order: u64 },

    /// The `opcode` attribute names no known instruction.
    #[error("instruction {order}: unknown opcode '{mnemonic}'")]
    UnknownOpcode { order: u64, mnemonic: String },

    /// An operand element is missing, duplicated, misnamed or carries a
    /// value that does not decode for its declared type.
    #[error("instruction {order}: {reason}")]
    InvalidOperand { order: u64, reason: String },

    /// The decoded instructions do not form a valid program.
    #[error(transparent)]
    Program(#[from] ProgramError),
}

impl LoadError {
    /// The error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LoadError::MalformedXml { .. } => ErrorKind::MalformedProgram,
            LoadError::Program(err) => err.kind(),
            _ => ErrorKind::UnexpectedStructure,
        }
    }

    pub(crate) fn operand(order: u64, reason: impl Into<String>) -> Self {
        LoadError::InvalidOperand {
            order,
            reason: reason.into(),
        }
    }
}
