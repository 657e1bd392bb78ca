//! Type tags for IPPcode22 values.

/// Identifies the type of a runtime value or a `type` operand.
///
/// `Nil` is a real type with a single value. An uninitialized variable has
/// no type at all and is represented by the absence of a value, never by a
/// tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Signed 64-bit integer.
    Int,
    /// Boolean.
    Bool,
    /// Unicode string.
    String,
    /// The `nil` type.
    Nil,
}

/// All type tags, in definition order.
pub const ALL_TYPE_TAGS: [TypeTag; 4] = [TypeTag::Int, TypeTag::Bool, TypeTag::String, TypeTag::Nil];

impl TypeTag {
    /// Returns the source-level name of this type (`int`, `bool`, ...).
    ///
    /// This is also the text `TYPE` stores into its destination.
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Int => "int",
            TypeTag::Bool => "bool",
            TypeTag::String => "string",
            TypeTag::Nil => "nil",
        }
    }

    /// Look up a type tag by its source-level name. Exact match only.
    pub fn from_name(name: &str) -> Option<TypeTag> {
        ALL_TYPE_TAGS.iter().find(|tt| tt.name() == name).copied()
    }

    /// Returns true if `READ` can produce a value of this type.
    pub fn is_readable(&self) -> bool {
        !matches!(self, TypeTag::Nil)
    }
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
