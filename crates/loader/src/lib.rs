//! IPPcode22 loader: XML program document to [`Program`].
//!
//! The document has a `program` root whose children are `instruction`
//! elements, each carrying `order` and `opcode` attributes and `argN`
//! operand elements:
//!
//! ```
//! use ippcode_loader::load;
//!
//! let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <program language="IPPcode22">
//!   <instruction order="1" opcode="WRITE">
//!     <arg1 type="string">Hello\032world</arg1>
//!   </instruction>
//! </program>"#;
//!
//! let program = load(xml).unwrap();
//! assert_eq!(program.len(), 1);
//! ```
//!
//! Instructions are sorted by `order` and re-indexed by execution position.
//! Operand shapes and labels are then validated by [`Program::new`].

pub mod error;

mod parser;

pub use error::LoadError;
pub use parser::decode_string;

use ippcode_common::Program;
use roxmltree::Document;
use tracing::debug;

/// Load a program from its XML text.
///
/// # Errors
///
/// [`LoadError::MalformedXml`] if the text is not well-formed XML; any
/// other variant for a well-formed document with invalid structure.
pub fn load(xml: &str) -> Result<Program, LoadError> {
    let doc = Document::parse(xml).map_err(|e| LoadError::MalformedXml {
        line: e.pos().row,
        message: e.to_string(),
    })?;

    let instructions = parser::parse_document(&doc)?;
    let program = Program::from_unordered(instructions)?;
    debug!(
        instructions = program.len(),
        labels = program.label_count(),
        "program loaded"
    );
    Ok(program)
}
