//! Variable store: the global frame, the local frame stack and the
//! temporary frame.
//!
//! The store is the only owner of frames. Callers address variables by
//! `(frame, name)` and never hold references across operations.

use ippcode_common::{Frame, Value, VarRef};
use std::collections::BTreeMap;
use std::io::{self, Write};
use thiserror::Error;
use tracing::debug;

/// Failures of variable store operations.
///
/// These carry no instruction position; the engine attaches one when it
/// converts them into a [`RuntimeError`](crate::RuntimeError).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The variable already exists in the addressed frame.
    #[error("variable {0} already declared")]
    Redeclared(VarRef),

    /// The variable is not declared in the addressed frame.
    #[error("variable {0} is not declared")]
    UndefinedVariable(VarRef),

    /// The addressed frame does not currently exist.
    #[error("frame {0} does not exist")]
    UndefinedFrame(Frame),

    /// The variable exists but was never written.
    #[error("variable {0} is uninitialized")]
    Uninitialized(VarRef),
}

/// A declared variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    /// Name without frame prefix.
    pub name: String,
    /// The frame designation it was declared through.
    pub declared_in: Frame,
    /// Current value. `None` until the first write.
    pub value: Option<Value>,
}

impl Variable {
    fn new(name: &str, declared_in: Frame) -> Self {
        Self {
            name: name.to_string(),
            declared_in,
            value: None,
        }
    }

    /// Returns true if the variable has never been written.
    pub fn is_uninitialized(&self) -> bool {
        self.value.is_none()
    }
}

/// One scope: name-unique mapping of variables.
///
/// Ordered so that `BREAK` dumps are deterministic.
pub type Scope = BTreeMap<String, Variable>;

/// The three frame regions.
#[derive(Debug, Default)]
pub struct Frames {
    global: Scope,
    locals: Vec<Scope>,
    temporary: Option<Scope>,
}

impl Frames {
    /// A store with only an empty global frame.
    pub fn new() -> Self {
        Self::default()
    }

    fn scope(&self, frame: Frame) -> Result<&Scope, FrameError> {
        match frame {
            Frame::Global => Ok(&self.global),
            Frame::Local => self.locals.last().ok_or(FrameError::UndefinedFrame(frame)),
            Frame::Temporary => self
                .temporary
                .as_ref()
                .ok_or(FrameError::UndefinedFrame(frame)),
        }
    }

    fn scope_mut(&mut self, frame: Frame) -> Result<&mut Scope, FrameError> {
        match frame {
            Frame::Global => Ok(&mut self.global),
            Frame::Local => self
                .locals
                .last_mut()
                .ok_or(FrameError::UndefinedFrame(frame)),
            Frame::Temporary => self
                .temporary
                .as_mut()
                .ok_or(FrameError::UndefinedFrame(frame)),
        }
    }

    /// Create an uninitialized variable.
    pub fn declare(&mut self, var: &VarRef) -> Result<(), FrameError> {
        let scope = self.scope_mut(var.frame)?;
        if scope.contains_key(&var.name) {
            return Err(FrameError::Redeclared(var.clone()));
        }
        scope.insert(var.name.clone(), Variable::new(&var.name, var.frame));
        Ok(())
    }

    /// Look up a variable. It need not hold a value.
    pub fn resolve(&self, var: &VarRef) -> Result<&Variable, FrameError> {
        self.scope(var.frame)?
            .get(&var.name)
            .ok_or_else(|| FrameError::UndefinedVariable(var.clone()))
    }

    /// Look up a variable and return its value, which must be present.
    pub fn read_value(&self, var: &VarRef) -> Result<&Value, FrameError> {
        self.resolve(var)?
            .value
            .as_ref()
            .ok_or_else(|| FrameError::Uninitialized(var.clone()))
    }

    /// Overwrite a variable's value and type.
    pub fn write(&mut self, var: &VarRef, value: Value) -> Result<(), FrameError> {
        let slot = self
            .scope_mut(var.frame)?
            .get_mut(&var.name)
            .ok_or_else(|| FrameError::UndefinedVariable(var.clone()))?;
        slot.value = Some(value);
        Ok(())
    }

    /// Replace the temporary frame with a fresh empty one. Any previous
    /// temporary frame is discarded.
    pub fn open_temporary(&mut self) {
        if self.temporary.is_some() {
            debug!("discarding unconsumed temporary frame");
        }
        self.temporary = Some(Scope::new());
    }

    /// Move the temporary frame onto the local stack.
    pub fn activate_temporary(&mut self) -> Result<(), FrameError> {
        let scope = self
            .temporary
            .take()
            .ok_or(FrameError::UndefinedFrame(Frame::Temporary))?;
        self.locals.push(scope);
        debug!(depth = self.locals.len(), "local frame pushed");
        Ok(())
    }

    /// Pop the top local frame into the temporary slot, replacing whatever
    /// was there.
    pub fn deactivate_top_local(&mut self) -> Result<(), FrameError> {
        let scope = self
            .locals
            .pop()
            .ok_or(FrameError::UndefinedFrame(Frame::Local))?;
        self.temporary = Some(scope);
        debug!(depth = self.locals.len(), "local frame popped");
        Ok(())
    }

    /// Number of activated local frames.
    pub fn local_depth(&self) -> usize {
        self.locals.len()
    }

    /// Returns true if a temporary frame exists.
    pub fn has_temporary(&self) -> bool {
        self.temporary.is_some()
    }

    /// Write a human-readable dump of all frames.
    pub fn dump(&self, out: &mut dyn Write) -> io::Result<()> {
        write!(out, "GF:")?;
        dump_scope(&self.global, out)?;
        if self.locals.is_empty() {
            writeln!(out, "LF: <none>")?;
        }
        for (depth, scope) in self.locals.iter().enumerate().rev() {
            write!(out, "LF[{depth}]:")?;
            dump_scope(scope, out)?;
        }
        match &self.temporary {
            Some(scope) => {
                write!(out, "TF:")?;
                dump_scope(scope, out)
            }
            None => writeln!(out, "TF: <none>"),
        }
    }
}

fn dump_scope(scope: &Scope, out: &mut dyn Write) -> io::Result<()> {
    for var in scope.values() {
        match &var.value {
            Some(Value::Str(s)) => write!(out, " {}=string@{s:?}", var.name)?,
            Some(Value::Nil) => write!(out, " {}=nil@nil", var.name)?,
            Some(value) => write!(out, " {}={}@{value}", var.name, value.type_tag())?,
            None => write!(out, " {}=<uninitialized>", var.name)?,
        }
    }
    writeln!(out)
}
