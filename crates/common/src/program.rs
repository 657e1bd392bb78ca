//! Program representation: instructions in execution order plus a label table.

use crate::error::ProgramError;
use crate::instruction::Instruction;
use std::collections::HashMap;

/// An IPPcode22 program, ready for execution.
///
/// Instructions are indexed by execution position `0..len()`. Construction
/// checks every instruction against its opcode's operand signature and
/// builds the label table, so the engine can trust the shape of what it
/// fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
}

impl Program {
    /// Build a program from instructions already in execution order.
    pub fn new(instructions: Vec<Instruction>) -> Result<Self, ProgramError> {
        let mut labels = HashMap::new();

        for (at, instr) in instructions.iter().enumerate() {
            let kinds = instr.opcode.operand_kinds();
            if instr.operands.len() != kinds.len() {
                return Err(ProgramError::Arity {
                    at,
                    opcode: instr.opcode,
                    expected: kinds.len(),
                    found: instr.operands.len(),
                });
            }
            for (slot, (operand, &kind)) in instr.operands.iter().zip(kinds).enumerate() {
                if !operand.fits(kind) {
                    return Err(ProgramError::operand_kind(at, instr.opcode, slot + 1, kind));
                }
            }

            if let Some(label) = instr.declared_label() {
                if let Some(&first) = labels.get(label) {
                    return Err(ProgramError::DuplicateLabel {
                        at,
                        first,
                        label: label.to_string(),
                    });
                }
                labels.insert(label.to_string(), at);
            }
        }

        Ok(Self {
            instructions,
            labels,
        })
    }

    /// Build a program from instructions in arbitrary order, sorting them by
    /// their declared `order`.
    pub fn from_unordered(mut instructions: Vec<Instruction>) -> Result<Self, ProgramError> {
        instructions.sort_by_key(|instr| instr.order);
        Self::new(instructions)
    }

    /// The instruction at an execution position.
    pub fn get(&self, position: usize) -> Option<&Instruction> {
        self.instructions.get(position)
    }

    /// Execution position of a label, if declared.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// All instructions in execution order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of declared labels.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::instruction::{Frame, Operand, VarRef};
    use crate::opcode::Opcode;
    use crate::value::Value;

    fn label(name: &str) -> Instruction {
        Instruction::new(Opcode::Label, vec![Operand::Label(name.into())])
    }

    fn defvar(name: &str) -> Instruction {
        Instruction::new(
            Opcode::DefVar,
            vec![Operand::Var(VarRef::new(Frame::Global, name))],
        )
    }

    #[test]
    fn empty_program() {
        let program = Program::new(vec![]).unwrap();
        assert!(program.is_empty());
        assert_eq!(program.len(), 0);
        assert_eq!(program.label_count(), 0);
    }

    #[test]
    fn label_positions() {
        let program = Program::new(vec![defvar("x"), label("a"), defvar("y"), label("b")]).unwrap();
        assert_eq!(program.label("a"), Some(1));
        assert_eq!(program.label("b"), Some(3));
        assert_eq!(program.label("c"), None);
        assert_eq!(program.label_count(), 2);
    }

    #[test]
    fn duplicate_label_rejected() {
        let err = Program::new(vec![label("a"), defvar("x"), label("a")]).unwrap_err();
        assert_eq!(
            err,
            ProgramError::DuplicateLabel {
                at: 2,
                first: 0,
                label: "a".to_string()
            }
        );
        assert_eq!(err.kind(), ErrorKind::Semantic);
    }

    #[test]
    fn arity_checked() {
        let err = Program::new(vec![Instruction::new(Opcode::Break, vec![Operand::Label("x".into())])])
            .unwrap_err();
        assert!(matches!(
            err,
            ProgramError::Arity {
                at: 0,
                expected: 0,
                found: 1,
                ..
            }
        ));
    }

    #[test]
    fn operand_kind_checked() {
        // DEFVAR needs a variable, not a literal.
        let err = Program::new(vec![Instruction::new(
            Opcode::DefVar,
            vec![Operand::Literal(Value::Int(3))],
        )])
        .unwrap_err();
        assert_eq!(
            err,
            ProgramError::OperandKind {
                at: 0,
                opcode: Opcode::DefVar,
                slot: 1,
                expected: "var"
            }
        );
    }

    #[test]
    fn from_unordered_sorts_by_declared_order() {
        let program = Program::from_unordered(vec![
            label("second").with_order(20),
            label("first").with_order(3),
            label("third").with_order(100),
        ])
        .unwrap();
        assert_eq!(program.label("first"), Some(0));
        assert_eq!(program.label("second"), Some(1));
        assert_eq!(program.label("third"), Some(2));
        assert_eq!(program.get(0).map(|i| i.order), Some(3));
    }

    #[test]
    fn get_out_of_range() {
        let program = Program::new(vec![defvar("x")]).unwrap();
        assert!(program.get(0).is_some());
        assert!(program.get(1).is_none());
    }
}
