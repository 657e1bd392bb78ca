//! Opcode definitions for the IPPcode22 instruction set.
//!
//! Each opcode carries a fixed operand signature; see [`Opcode::operand_kinds`].

/// The kind of operand an instruction slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// A frame-qualified variable reference.
    Var,
    /// A variable reference or a typed literal.
    Symb,
    /// A label name.
    Label,
    /// A type name (`int`, `bool`, `string`).
    Type,
}

impl OperandKind {
    /// Human-readable name, as used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            OperandKind::Var => "var",
            OperandKind::Symb => "symb",
            OperandKind::Label => "label",
            OperandKind::Type => "type",
        }
    }
}

/// Identifies the operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Frames, function calls
    /// Copy a symbol into a variable.
    Move,
    /// Replace the temporary frame with a fresh empty one.
    CreateFrame,
    /// Activate the temporary frame as the new local frame.
    PushFrame,
    /// Move the top local frame back into the temporary slot.
    PopFrame,
    /// Declare an uninitialized variable.
    DefVar,
    /// Save the return position and jump to a label.
    Call,
    /// Jump to the most recently saved return position.
    Return,

    // Data stack
    /// Push a symbol onto the data stack.
    Pushs,
    /// Pop the data stack into a variable.
    Pops,

    // Arithmetic, relational, boolean, conversion
    /// Integer addition.
    Add,
    /// Integer subtraction.
    Sub,
    /// Integer multiplication.
    Mul,
    /// Integer floor division.
    Idiv,
    /// Less-than.
    Lt,
    /// Greater-than.
    Gt,
    /// Equality, with `nil` allowed against any type.
    Eq,
    /// Boolean conjunction.
    And,
    /// Boolean disjunction.
    Or,
    /// Boolean negation.
    Not,
    /// Code point to one-character string.
    Int2Char,
    /// Code point of the character at a position.
    Stri2Int,

    // Input/output
    /// Read a line from the input source as a given type.
    Read,
    /// Print a symbol to standard output.
    Write,

    // Strings
    /// Concatenate two strings.
    Concat,
    /// Length of a string in characters.
    Strlen,
    /// One-character string at a position.
    GetChar,
    /// Replace one character of a string variable.
    SetChar,

    // Types
    /// Store the type name of a symbol.
    Type,

    // Control flow
    /// Mark a jump target. No runtime effect.
    Label,
    /// Unconditional jump.
    Jump,
    /// Jump if two symbols are equal.
    JumpIfEq,
    /// Jump if two symbols are not equal.
    JumpIfNeq,
    /// Terminate with an exit code in `0..=49`.
    Exit,

    // Debugging
    /// Print a symbol to standard error.
    Dprint,
    /// Dump interpreter state to standard error.
    Break,
}

/// All valid opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 35] = [
    Opcode::Move,
    Opcode::CreateFrame,
    Opcode::PushFrame,
    Opcode::PopFrame,
    Opcode::DefVar,
    Opcode::Call,
    Opcode::Return,
    Opcode::Pushs,
    Opcode::Pops,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Idiv,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Eq,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Int2Char,
    Opcode::Stri2Int,
    Opcode::Read,
    Opcode::Write,
    Opcode::Concat,
    Opcode::Strlen,
    Opcode::GetChar,
    Opcode::SetChar,
    Opcode::Type,
    Opcode::Label,
    Opcode::Jump,
    Opcode::JumpIfEq,
    Opcode::JumpIfNeq,
    Opcode::Exit,
    Opcode::Dprint,
    Opcode::Break,
];

use OperandKind::{Label, Symb, Type, Var};

impl Opcode {
    /// Returns the assembly mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::CreateFrame => "CREATEFRAME",
            Opcode::PushFrame => "PUSHFRAME",
            Opcode::PopFrame => "POPFRAME",
            Opcode::DefVar => "DEFVAR",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Pushs => "PUSHS",
            Opcode::Pops => "POPS",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Idiv => "IDIV",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Eq => "EQ",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Int2Char => "INT2CHAR",
            Opcode::Stri2Int => "STRI2INT",
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Concat => "CONCAT",
            Opcode::Strlen => "STRLEN",
            Opcode::GetChar => "GETCHAR",
            Opcode::SetChar => "SETCHAR",
            Opcode::Type => "TYPE",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfEq => "JUMPIFEQ",
            Opcode::JumpIfNeq => "JUMPIFNEQ",
            Opcode::Exit => "EXIT",
            Opcode::Dprint => "DPRINT",
            Opcode::Break => "BREAK",
        }
    }

    /// Look up an opcode by mnemonic, ignoring ASCII case.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
            .copied()
    }

    /// The fixed operand signature of this opcode. Its length is the arity.
    pub fn operand_kinds(&self) -> &'static [OperandKind] {
        match self {
            Opcode::CreateFrame
            | Opcode::PushFrame
            | Opcode::PopFrame
            | Opcode::Return
            | Opcode::Break => &[],

            Opcode::Label | Opcode::Jump | Opcode::Call => &[Label],

            Opcode::Pushs | Opcode::Write | Opcode::Exit | Opcode::Dprint => &[Symb],

            Opcode::DefVar | Opcode::Pops => &[Var],

            Opcode::Move
            | Opcode::Not
            | Opcode::Int2Char
            | Opcode::Strlen
            | Opcode::Type => &[Var, Symb],

            Opcode::Read => &[Var, Type],

            Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Idiv
            | Opcode::Lt
            | Opcode::Gt
            | Opcode::Eq
            | Opcode::And
            | Opcode::Or
            | Opcode::Stri2Int
            | Opcode::Concat
            | Opcode::GetChar
            | Opcode::SetChar => &[Var, Symb, Symb],

            Opcode::JumpIfEq | Opcode::JumpIfNeq => &[Label, Symb, Symb],
        }
    }

    /// Number of operands this opcode takes.
    pub fn arity(&self) -> usize {
        self.operand_kinds().len()
    }
}

impl std::fmt::Display for Opcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_opcodes_count() {
        assert_eq!(ALL_OPCODES.len(), 35);
    }

    #[test]
    fn mnemonic_lookup_roundtrip() {
        for &opcode in &ALL_OPCODES {
            assert_eq!(Opcode::from_mnemonic(opcode.mnemonic()), Some(opcode));
        }
    }

    #[test]
    fn mnemonic_lookup_ignores_case() {
        assert_eq!(Opcode::from_mnemonic("move"), Some(Opcode::Move));
        assert_eq!(Opcode::from_mnemonic("JumpIfNeq"), Some(Opcode::JumpIfNeq));
        assert_eq!(Opcode::from_mnemonic("createFrame"), Some(Opcode::CreateFrame));
    }

    #[test]
    fn unknown_mnemonic() {
        assert_eq!(Opcode::from_mnemonic("HALT"), None);
        assert_eq!(Opcode::from_mnemonic(""), None);
        assert_eq!(Opcode::from_mnemonic("STR2INT"), None);
    }

    #[test]
    fn mnemonics_are_uppercase() {
        for &opcode in &ALL_OPCODES {
            let m = opcode.mnemonic();
            assert!(!m.is_empty(), "empty mnemonic for {opcode:?}");
            assert_eq!(m, m.to_uppercase(), "mnemonic should be uppercase: {m}");
        }
    }

    #[test]
    fn arities() {
        assert_eq!(Opcode::Break.arity(), 0);
        assert_eq!(Opcode::Call.arity(), 1);
        assert_eq!(Opcode::Not.arity(), 2);
        assert_eq!(Opcode::Read.arity(), 2);
        assert_eq!(Opcode::SetChar.arity(), 3);
        assert_eq!(Opcode::JumpIfEq.arity(), 3);
    }

    #[test]
    fn destination_operand_comes_first() {
        for &opcode in &ALL_OPCODES {
            let kinds = opcode.operand_kinds();
            assert!(
                kinds.iter().skip(1).all(|k| *k != OperandKind::Var),
                "{opcode} has a var operand outside slot 1"
            );
        }
    }

    #[test]
    fn conditional_jumps_take_label_then_two_symbols() {
        assert_eq!(Opcode::JumpIfEq.operand_kinds(), &[Label, Symb, Symb]);
        assert_eq!(Opcode::JumpIfNeq.operand_kinds(), &[Label, Symb, Symb]);
    }
}
