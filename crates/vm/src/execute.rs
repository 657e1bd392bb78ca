//! Main execution loop and opcode dispatch for the IPPcode22 VM.

use crate::error::RuntimeError;
use crate::machine::{Flow, Termination, VM};
use ippcode_common::{Instruction, Opcode, Operand, TypeTag, Value};
use std::cmp::Ordering;
use std::io::{self, Write};
use tracing::{debug, trace};

/// Integer division rounding toward negative infinity.
///
/// The caller guarantees `b != 0`. `i64::MIN / -1` wraps.
pub fn floor_div(a: i64, b: i64) -> i64 {
    let q = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

/// Describe the types of a pair of operands for diagnostics.
fn pair_types(a: &Value, b: &Value) -> String {
    format!("{} and {}", a.type_tag(), b.type_tag())
}

impl<'a> VM<'a> {
    /// Execute the program until it falls off the end, runs EXIT, or fails.
    pub fn execute(&mut self) -> Result<Termination, RuntimeError> {
        debug!(
            instructions = self.program.len(),
            labels = self.program.label_count(),
            "execution started"
        );

        while let Some(instr) = self.fetch() {
            trace!(pc = self.pc, instr = %instr, "dispatch");
            self.executed += 1;

            match self.dispatch(instr)? {
                Flow::Next => self.pc += 1,
                Flow::Goto(target) => self.pc = target,
                Flow::Halt(termination) => {
                    debug!(pc = self.pc, ?termination, "exit");
                    return Ok(termination);
                }
            }
        }

        debug!(executed = self.executed, "execution completed");
        Ok(Termination::Completed)
    }

    fn dispatch(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        match instr.opcode {
            // Frames, function calls
            Opcode::Move => self.exec_move(instr)?,
            Opcode::CreateFrame => self.frames.open_temporary(),
            Opcode::PushFrame => self
                .frames
                .activate_temporary()
                .map_err(|e| self.frame_err(e))?,
            Opcode::PopFrame => self
                .frames
                .deactivate_top_local()
                .map_err(|e| self.frame_err(e))?,
            Opcode::DefVar => self.exec_defvar(instr)?,
            Opcode::Call => return self.exec_call(instr),
            Opcode::Return => return self.exec_return(),

            // Data stack
            Opcode::Pushs => self.exec_pushs(instr)?,
            Opcode::Pops => self.exec_pops(instr)?,

            // Arithmetic
            Opcode::Add => self.exec_arith(instr, i64::wrapping_add)?,
            Opcode::Sub => self.exec_arith(instr, i64::wrapping_sub)?,
            Opcode::Mul => self.exec_arith(instr, i64::wrapping_mul)?,
            Opcode::Idiv => self.exec_idiv(instr)?,

            // Relational
            Opcode::Lt => self.exec_ordering(instr, Ordering::Less)?,
            Opcode::Gt => self.exec_ordering(instr, Ordering::Greater)?,
            Opcode::Eq => self.exec_eq(instr)?,

            // Logic
            Opcode::And => self.exec_logic(instr, |a, b| a && b)?,
            Opcode::Or => self.exec_logic(instr, |a, b| a || b)?,
            Opcode::Not => self.exec_not(instr)?,

            // Conversions and strings
            Opcode::Int2Char => self.exec_int2char(instr)?,
            Opcode::Stri2Int => self.exec_stri2int(instr)?,
            Opcode::Concat => self.exec_concat(instr)?,
            Opcode::Strlen => self.exec_strlen(instr)?,
            Opcode::GetChar => self.exec_getchar(instr)?,
            Opcode::SetChar => self.exec_setchar(instr)?,
            Opcode::Type => self.exec_type(instr)?,

            // I/O
            Opcode::Read => self.exec_read(instr)?,
            Opcode::Write => self.exec_write(instr)?,
            Opcode::Dprint => self.exec_dprint(instr)?,
            Opcode::Break => self.exec_break()?,

            // Control flow
            Opcode::Label => {}
            Opcode::Jump => {
                let label = self.label_operand(instr, 0)?;
                return Ok(Flow::Goto(self.label_target(label)?));
            }
            Opcode::JumpIfEq => return self.exec_jump_if(instr, true),
            Opcode::JumpIfNeq => return self.exec_jump_if(instr, false),
            Opcode::Exit => return self.exec_exit(instr),
        }
        Ok(Flow::Next)
    }

    // ---- Frames, function calls ----

    fn exec_move(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let value = self.symbol(instr, 1)?;
        self.store(dest, value)
    }

    fn exec_defvar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let var = self.var_operand(instr, 0)?;
        self.frames.declare(var).map_err(|e| self.frame_err(e))
    }

    fn exec_call(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        let label = self.label_operand(instr, 0)?;
        let target = self.label_target(label)?;
        self.call_stack.push(self.pc + 1);
        debug!(from = self.pc, to = target, depth = self.call_stack.len(), "call");
        Ok(Flow::Goto(target))
    }

    fn exec_return(&mut self) -> Result<Flow, RuntimeError> {
        let target = self
            .call_stack
            .pop()
            .ok_or(RuntimeError::EmptyCallStack { at: self.pc })?;
        debug!(from = self.pc, to = target, depth = self.call_stack.len(), "return");
        Ok(Flow::Goto(target))
    }

    // ---- Data stack ----

    fn exec_pushs(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.symbol(instr, 0)?;
        self.data_stack.push(value);
        Ok(())
    }

    fn exec_pops(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        if self.data_stack.is_empty() {
            return Err(RuntimeError::EmptyDataStack { at: self.pc });
        }
        let dest = self.destination(instr, 0)?;
        match self.data_stack.pop() {
            Some(value) => self.store(dest, value),
            None => Err(RuntimeError::EmptyDataStack { at: self.pc }),
        }
    }

    // ---- Operand helpers ----

    fn int_pair(&self, instr: &Instruction) -> Result<(i64, i64), RuntimeError> {
        let a = self.symbol(instr, 1)?;
        let b = self.symbol(instr, 2)?;
        match (&a, &b) {
            (Value::Int(x), Value::Int(y)) => Ok((*x, *y)),
            _ => Err(self.operand_type(instr, pair_types(&a, &b))),
        }
    }

    fn operand_type(&self, instr: &Instruction, found: String) -> RuntimeError {
        RuntimeError::OperandType {
            at: self.pc,
            opcode: instr.opcode,
            found,
        }
    }

    fn string_index(&self, text: &str, index: i64) -> Result<(Vec<char>, usize), RuntimeError> {
        let chars: Vec<char> = text.chars().collect();
        match usize::try_from(index) {
            Ok(i) if i < chars.len() => Ok((chars, i)),
            _ => Err(RuntimeError::StringIndexOutOfRange {
                at: self.pc,
                index,
                length: chars.len(),
            }),
        }
    }

    // ---- Arithmetic ----

    fn exec_arith(&mut self, instr: &Instruction, op: fn(i64, i64) -> i64) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let (a, b) = self.int_pair(instr)?;
        self.store(dest, Value::Int(op(a, b)))
    }

    fn exec_idiv(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let (a, b) = self.int_pair(instr)?;
        if b == 0 {
            return Err(RuntimeError::DivisionByZero { at: self.pc });
        }
        self.store(dest, Value::Int(floor_div(a, b)))
    }

    // ---- Relational ----

    fn exec_ordering(&mut self, instr: &Instruction, wanted: Ordering) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let a = self.symbol(instr, 1)?;
        let b = self.symbol(instr, 2)?;
        let ordering = a
            .ordering(&b)
            .ok_or_else(|| self.operand_type(instr, pair_types(&a, &b)))?;
        self.store(dest, Value::Bool(ordering == wanted))
    }

    fn exec_eq(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let a = self.symbol(instr, 1)?;
        let b = self.symbol(instr, 2)?;
        let equal = a
            .loose_eq(&b)
            .ok_or_else(|| self.operand_type(instr, pair_types(&a, &b)))?;
        self.store(dest, Value::Bool(equal))
    }

    // ---- Logic ----

    fn exec_logic(&mut self, instr: &Instruction, op: fn(bool, bool) -> bool) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let a = self.symbol(instr, 1)?;
        let b = self.symbol(instr, 2)?;
        match (&a, &b) {
            (Value::Bool(x), Value::Bool(y)) => self.store(dest, Value::Bool(op(*x, *y))),
            _ => Err(self.operand_type(instr, pair_types(&a, &b))),
        }
    }

    fn exec_not(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        match self.symbol(instr, 1)? {
            Value::Bool(x) => self.store(dest, Value::Bool(!x)),
            other => Err(self.operand_type(instr, other.type_tag().to_string())),
        }
    }

    // ---- Conversions and strings ----

    fn exec_int2char(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let code = match self.symbol(instr, 1)? {
            Value::Int(n) => n,
            other => return Err(self.operand_type(instr, other.type_tag().to_string())),
        };
        let ch = u32::try_from(code)
            .ok()
            .and_then(char::from_u32)
            .ok_or(RuntimeError::InvalidCodePoint {
                at: self.pc,
                value: code,
            })?;
        self.store(dest, Value::Str(ch.to_string()))
    }

    /// Shared operand handling of STRI2INT and GETCHAR: a string and an
    /// in-range position.
    fn char_at(&self, instr: &Instruction) -> Result<char, RuntimeError> {
        let text = self.symbol(instr, 1)?;
        let index = self.symbol(instr, 2)?;
        match (&text, &index) {
            (Value::Str(s), Value::Int(i)) => {
                let (chars, i) = self.string_index(s, *i)?;
                Ok(chars[i])
            }
            _ => Err(self.operand_type(instr, pair_types(&text, &index))),
        }
    }

    fn exec_stri2int(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let ch = self.char_at(instr)?;
        self.store(dest, Value::Int(i64::from(u32::from(ch))))
    }

    fn exec_getchar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let ch = self.char_at(instr)?;
        self.store(dest, Value::Str(ch.to_string()))
    }

    fn exec_concat(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let a = self.symbol(instr, 1)?;
        let b = self.symbol(instr, 2)?;
        match (a, b) {
            (Value::Str(mut x), Value::Str(y)) => {
                x.push_str(&y);
                self.store(dest, Value::Str(x))
            }
            (a, b) => Err(self.operand_type(instr, pair_types(&a, &b))),
        }
    }

    fn exec_strlen(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        match self.symbol(instr, 1)? {
            Value::Str(s) => {
                let length = i64::try_from(s.chars().count()).unwrap_or(i64::MAX);
                self.store(dest, Value::Int(length))
            }
            other => Err(self.operand_type(instr, other.type_tag().to_string())),
        }
    }

    fn exec_setchar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.var_operand(instr, 0)?;
        let current = self
            .frames
            .read_value(dest)
            .cloned()
            .map_err(|e| self.frame_err(e))?;
        let index = self.symbol(instr, 1)?;
        let source = self.symbol(instr, 2)?;

        let (target, index, source) = match (current, index, source) {
            (Value::Str(t), Value::Int(i), Value::Str(s)) => (t, i, s),
            (t, i, s) => {
                let found = format!("{}, {} and {}", t.type_tag(), i.type_tag(), s.type_tag());
                return Err(self.operand_type(instr, found));
            }
        };

        let replacement = source
            .chars()
            .next()
            .ok_or(RuntimeError::EmptyReplacement { at: self.pc })?;
        let (mut chars, i) = self.string_index(&target, index)?;
        chars[i] = replacement;
        self.store(dest, Value::Str(chars.into_iter().collect()))
    }

    fn exec_type(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let name = match &instr.operands.get(1) {
            Some(Operand::Var(var)) => {
                let variable = self.frames.resolve(var).map_err(|e| self.frame_err(e))?;
                variable
                    .value
                    .as_ref()
                    .map(|v| v.type_tag().name())
                    .unwrap_or("")
            }
            Some(Operand::Literal(value)) => value.type_tag().name(),
            _ => return Err(self.malformed(instr)),
        };
        self.store(dest, Value::Str(name.to_string()))
    }

    // ---- I/O ----

    fn exec_read(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let dest = self.destination(instr, 0)?;
        let ty = self.type_operand(instr, 1)?;
        if !ty.is_readable() {
            return Err(self.malformed(instr));
        }
        // Pending WRITE output must be visible before blocking on input.
        self.out.flush().map_err(|e| self.output_failed(e))?;
        let line = self.input.next_line().map_err(|e| RuntimeError::InputAccess {
            at: self.pc,
            message: e.to_string(),
        })?;

        let value = match (line, ty) {
            (None, _) => Value::Nil,
            (Some(text), TypeTag::Int) => text.trim().parse().map(Value::Int).unwrap_or(Value::Nil),
            (Some(text), TypeTag::Bool) => Value::Bool(text.to_lowercase() == "true"),
            (Some(text), TypeTag::String | TypeTag::Nil) => Value::Str(text),
        };
        trace!(pc = self.pc, value = ?value, "read");
        self.store(dest, value)
    }

    fn exec_write(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.symbol(instr, 0)?;
        write!(self.out, "{value}").map_err(|e| self.output_failed(e))
    }

    fn exec_dprint(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let value = self.symbol(instr, 0)?;
        writeln!(self.diag, "{value}").map_err(|e| self.output_failed(e))
    }

    fn exec_break(&mut self) -> Result<(), RuntimeError> {
        self.dump_state().map_err(|e| self.output_failed(e))
    }

    fn dump_state(&mut self) -> io::Result<()> {
        writeln!(
            self.diag,
            "BREAK at instruction {} ({} executed)",
            self.pc, self.executed
        )?;
        self.frames.dump(&mut *self.diag)?;
        writeln!(self.diag, "call stack: {:?}", self.call_stack)?;
        write!(self.diag, "data stack:")?;
        for value in self.data_stack.iter().rev() {
            match value {
                Value::Str(s) => write!(self.diag, " string@{s:?}")?,
                Value::Nil => write!(self.diag, " nil@nil")?,
                other => write!(self.diag, " {}@{other}", other.type_tag())?,
            }
        }
        writeln!(self.diag)
    }

    // ---- Control flow ----

    fn exec_jump_if(&mut self, instr: &Instruction, when_equal: bool) -> Result<Flow, RuntimeError> {
        let label = self.label_operand(instr, 0)?;
        let target = self.label_target(label)?;
        let a = self.symbol(instr, 1)?;
        let b = self.symbol(instr, 2)?;
        let equal = a
            .loose_eq(&b)
            .ok_or_else(|| self.operand_type(instr, pair_types(&a, &b)))?;

        if equal == when_equal {
            Ok(Flow::Goto(target))
        } else {
            Ok(Flow::Next)
        }
    }

    fn exec_exit(&mut self, instr: &Instruction) -> Result<Flow, RuntimeError> {
        let code = match self.symbol(instr, 0)? {
            Value::Int(n) => n,
            other => return Err(self.operand_type(instr, other.type_tag().to_string())),
        };
        match u8::try_from(code) {
            Ok(c) if c <= 49 => Ok(Flow::Halt(Termination::Exit(c))),
            _ => Err(RuntimeError::ExitCodeOutOfRange { at: self.pc, code }),
        }
    }
}
