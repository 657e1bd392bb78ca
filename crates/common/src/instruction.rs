//! Instruction and operand representation.
//!
//! An instruction is an opcode plus a fixed-arity list of operands:
//! ```text
//! ADD      GF@sum   int@1   LF@x
//! ^opcode  ^var     ^literal ^var
//! ```

use crate::opcode::{OperandKind, Opcode};
use crate::type_tag::TypeTag;
use crate::value::Value;
use std::fmt;

/// Which scope region a variable reference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    /// The global frame, alive for the whole run.
    Global,
    /// The top of the local frame stack.
    Local,
    /// The pending temporary frame.
    Temporary,
}

impl Frame {
    /// The two-letter source prefix (`GF`, `LF`, `TF`).
    pub fn prefix(&self) -> &'static str {
        match self {
            Frame::Global => "GF",
            Frame::Local => "LF",
            Frame::Temporary => "TF",
        }
    }

    /// Look up a frame by its source prefix. Exact match only.
    pub fn from_prefix(prefix: &str) -> Option<Frame> {
        match prefix {
            "GF" => Some(Frame::Global),
            "LF" => Some(Frame::Local),
            "TF" => Some(Frame::Temporary),
            _ => None,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// A frame-qualified variable reference, e.g. `LF@counter`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VarRef {
    /// The frame the variable lives in.
    pub frame: Frame,
    /// The variable name, without the frame prefix.
    pub name: String,
}

impl VarRef {
    /// Create a new variable reference.
    pub fn new(frame: Frame, name: impl Into<String>) -> Self {
        Self {
            frame,
            name: name.into(),
        }
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.frame, self.name)
    }
}

/// A single instruction argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A variable reference.
    Var(VarRef),
    /// A literal carrying its declared type.
    Literal(Value),
    /// A label name.
    Label(String),
    /// A type name.
    Type(TypeTag),
}

impl Operand {
    /// Returns true if this operand may fill a slot of the given kind.
    pub fn fits(&self, kind: OperandKind) -> bool {
        matches!(
            (self, kind),
            (Operand::Var(_), OperandKind::Var | OperandKind::Symb)
                | (Operand::Literal(_), OperandKind::Symb)
                | (Operand::Label(_), OperandKind::Label)
                | (Operand::Type(_), OperandKind::Type)
        )
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Var(var) => write!(f, "{var}"),
            Operand::Literal(Value::Str(s)) => write!(f, "string@{s}"),
            Operand::Literal(Value::Nil) => f.write_str("nil@nil"),
            Operand::Literal(value) => write!(f, "{}@{value}", value.type_tag()),
            Operand::Label(label) => f.write_str(label),
            Operand::Type(tag) => write!(f, "{tag}"),
        }
    }
}

/// A single IPPcode22 instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The operation to perform.
    pub opcode: Opcode,
    /// The `order` attribute the instruction was declared with. Used only to
    /// sort the program; execution addresses instructions by position.
    pub order: u64,
    /// Operands, in slot order.
    pub operands: Vec<Operand>,
}

impl Instruction {
    /// Create a new instruction with declared order 0.
    pub fn new(opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self {
            opcode,
            order: 0,
            operands,
        }
    }

    /// Set the declared order.
    pub fn with_order(mut self, order: u64) -> Self {
        self.order = order;
        self
    }

    /// The label this instruction declares, if it is a `LABEL`.
    pub fn declared_label(&self) -> Option<&str> {
        match (self.opcode, self.operands.first()) {
            (Opcode::Label, Some(Operand::Label(name))) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode.mnemonic())?;
        for operand in &self.operands {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_prefixes() {
        for frame in [Frame::Global, Frame::Local, Frame::Temporary] {
            assert_eq!(Frame::from_prefix(frame.prefix()), Some(frame));
        }
        assert_eq!(Frame::from_prefix("gf"), None);
        assert_eq!(Frame::from_prefix("XF"), None);
    }

    #[test]
    fn operand_fits_slot_kinds() {
        let var = Operand::Var(VarRef::new(Frame::Global, "x"));
        let lit = Operand::Literal(Value::Int(1));
        let label = Operand::Label("end".into());
        let ty = Operand::Type(TypeTag::Int);

        assert!(var.fits(OperandKind::Var));
        assert!(var.fits(OperandKind::Symb));
        assert!(!var.fits(OperandKind::Label));

        assert!(lit.fits(OperandKind::Symb));
        assert!(!lit.fits(OperandKind::Var));

        assert!(label.fits(OperandKind::Label));
        assert!(!label.fits(OperandKind::Symb));

        assert!(ty.fits(OperandKind::Type));
        assert!(!ty.fits(OperandKind::Symb));
    }

    #[test]
    fn declared_label() {
        let label = Instruction::new(Opcode::Label, vec![Operand::Label("loop".into())]);
        assert_eq!(label.declared_label(), Some("loop"));

        let jump = Instruction::new(Opcode::Jump, vec![Operand::Label("loop".into())]);
        assert_eq!(jump.declared_label(), None);
    }

    #[test]
    fn display_source_form() {
        let instr = Instruction::new(
            Opcode::Add,
            vec![
                Operand::Var(VarRef::new(Frame::Local, "sum")),
                Operand::Literal(Value::Int(-2)),
                Operand::Literal(Value::Nil),
            ],
        );
        assert_eq!(instr.to_string(), "ADD LF@sum int@-2 nil@nil");
    }

    #[test]
    fn with_order_sets_declared_order() {
        let instr = Instruction::new(Opcode::Break, vec![]).with_order(7);
        assert_eq!(instr.order, 7);
    }
}
