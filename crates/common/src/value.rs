//! Runtime value representation for the IPPcode22 interpreter.
//!
//! Values live in variables and on the data stack.

use crate::type_tag::TypeTag;
use std::cmp::Ordering;
use std::fmt;

/// Runtime value representation.
///
/// A variable that was declared but never written holds no `Value` at all
/// (`Option::None` in the variable store). That state is distinct from
/// [`Value::Nil`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Signed 64-bit integer.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Sequence of Unicode scalar values.
    Str(String),
    /// The single value of type `nil`.
    Nil,
}

impl Value {
    /// Returns the type tag for this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Int(_) => TypeTag::Int,
            Value::Bool(_) => TypeTag::Bool,
            Value::Str(_) => TypeTag::String,
            Value::Nil => TypeTag::Nil,
        }
    }

    /// Equality as the relational operators see it.
    ///
    /// Same-tag values compare by content. `nil` compared with any other
    /// tag is unequal. Any other cross-tag pair has no defined equality
    /// and yields `None`.
    pub fn loose_eq(&self, other: &Value) -> Option<bool> {
        match (self, other) {
            (Value::Nil, Value::Nil) => Some(true),
            (Value::Nil, _) | (_, Value::Nil) => Some(false),
            _ if self.type_tag() == other.type_tag() => Some(self == other),
            _ => None,
        }
    }

    /// Ordering as `LT`/`GT` see it.
    ///
    /// Defined for `int`/`int` and `string`/`string` (by code point).
    /// Everything else, `bool` and `nil` included, yields `None`.
    pub fn ordering(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

/// Textual form used by `WRITE` and `DPRINT`. `nil` prints as nothing.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(true) => f.write_str("true"),
            Value::Bool(false) => f.write_str("false"),
            Value::Str(s) => f.write_str(s),
            Value::Nil => Ok(()),
        }
    }
}
