//! VM state management: program counter, call stack, data stack, frames and
//! the I/O endpoints.

use crate::error::RuntimeError;
use crate::frames::{FrameError, Frames};
use crate::input::InputSource;
use ippcode_common::{Instruction, Operand, Program, TypeTag, Value, VarRef};
use std::io::Write;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Execution fell off the end of the program.
    Completed,
    /// An EXIT instruction ran with this code.
    Exit(u8),
}

impl Termination {
    /// The process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Termination::Completed => 0,
            Termination::Exit(code) => i32::from(*code),
        }
    }
}

/// What the dispatch loop does after a handler returns.
pub(crate) enum Flow {
    /// Advance to the next instruction.
    Next,
    /// Continue at this position.
    Goto(usize),
    /// Stop with this outcome.
    Halt(Termination),
}

/// The IPPcode22 virtual machine.
pub struct VM<'a> {
    /// The program being executed.
    pub(crate) program: &'a Program,
    /// Program counter (execution position).
    pub(crate) pc: usize,
    /// Saved return positions, pushed by CALL and popped by RETURN.
    pub(crate) call_stack: Vec<usize>,
    /// Values pushed by PUSHS and popped by POPS.
    pub(crate) data_stack: Vec<Value>,
    /// Variable store.
    pub(crate) frames: Frames,
    /// Lines for READ.
    pub(crate) input: &'a mut dyn InputSource,
    /// Destination of WRITE.
    pub(crate) out: &'a mut dyn Write,
    /// Destination of DPRINT and BREAK.
    pub(crate) diag: &'a mut dyn Write,
    /// Instructions executed so far.
    pub(crate) executed: u64,
}

impl<'a> VM<'a> {
    /// Create a new VM for the given program and I/O endpoints.
    pub fn new(
        program: &'a Program,
        input: &'a mut dyn InputSource,
        out: &'a mut dyn Write,
        diag: &'a mut dyn Write,
    ) -> Self {
        Self {
            program,
            pc: 0,
            call_stack: Vec::new(),
            data_stack: Vec::new(),
            frames: Frames::new(),
            input,
            out,
            diag,
            executed: 0,
        }
    }

    /// The variable store, for inspection after (or between) runs.
    pub fn frames(&self) -> &Frames {
        &self.frames
    }

    /// Current program counter.
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// Depth of the data stack.
    pub fn data_depth(&self) -> usize {
        self.data_stack.len()
    }

    /// Depth of the call stack.
    pub fn call_depth(&self) -> usize {
        self.call_stack.len()
    }

    /// Number of instructions executed so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    pub(crate) fn frame_err(&self, err: FrameError) -> RuntimeError {
        err.at(self.pc)
    }

    pub(crate) fn malformed(&self, instr: &Instruction) -> RuntimeError {
        RuntimeError::MalformedInstruction {
            at: self.pc,
            opcode: instr.opcode,
        }
    }

    fn operand<'i>(&self, instr: &'i Instruction, slot: usize) -> Result<&'i Operand, RuntimeError> {
        instr.operands.get(slot).ok_or_else(|| self.malformed(instr))
    }

    /// The variable operand in `slot`.
    pub(crate) fn var_operand<'i>(
        &self,
        instr: &'i Instruction,
        slot: usize,
    ) -> Result<&'i VarRef, RuntimeError> {
        match self.operand(instr, slot)? {
            Operand::Var(var) => Ok(var),
            _ => Err(self.malformed(instr)),
        }
    }

    /// The label operand in `slot`.
    pub(crate) fn label_operand<'i>(
        &self,
        instr: &'i Instruction,
        slot: usize,
    ) -> Result<&'i str, RuntimeError> {
        match self.operand(instr, slot)? {
            Operand::Label(label) => Ok(label),
            _ => Err(self.malformed(instr)),
        }
    }

    /// The type operand in `slot`.
    pub(crate) fn type_operand(&self, instr: &Instruction, slot: usize) -> Result<TypeTag, RuntimeError> {
        match self.operand(instr, slot)? {
            Operand::Type(tag) => Ok(*tag),
            _ => Err(self.malformed(instr)),
        }
    }

    /// Resolve the symbol in `slot` to a concrete value. Variables must be
    /// initialized.
    pub(crate) fn symbol(&self, instr: &Instruction, slot: usize) -> Result<Value, RuntimeError> {
        match self.operand(instr, slot)? {
            Operand::Var(var) => self
                .frames
                .read_value(var)
                .cloned()
                .map_err(|e| self.frame_err(e)),
            Operand::Literal(value) => Ok(value.clone()),
            _ => Err(self.malformed(instr)),
        }
    }

    /// Check that the destination variable in `slot` exists and return it.
    pub(crate) fn destination<'i>(
        &self,
        instr: &'i Instruction,
        slot: usize,
    ) -> Result<&'i VarRef, RuntimeError> {
        let var = self.var_operand(instr, slot)?;
        self.frames.resolve(var).map_err(|e| self.frame_err(e))?;
        Ok(var)
    }

    /// Store a value into a variable.
    pub(crate) fn store(&mut self, var: &VarRef, value: Value) -> Result<(), RuntimeError> {
        self.frames.write(var, value).map_err(|e| e.at(self.pc))
    }

    /// Look up a label's execution position.
    pub(crate) fn label_target(&self, label: &str) -> Result<usize, RuntimeError> {
        self.program
            .label(label)
            .ok_or_else(|| RuntimeError::UndefinedLabel {
                at: self.pc,
                label: label.to_string(),
            })
    }

    /// Fetch the instruction at the current pc.
    pub(crate) fn fetch(&self) -> Option<&'a Instruction> {
        self.program.get(self.pc)
    }

    pub(crate) fn output_failed(&self, err: std::io::Error) -> RuntimeError {
        RuntimeError::OutputAccess {
            at: self.pc,
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn termination_exit_codes() {
        assert_eq!(Termination::Completed.exit_code(), 0);
        assert_eq!(Termination::Exit(0).exit_code(), 0);
        assert_eq!(Termination::Exit(49).exit_code(), 49);
    }
}
