//! Declared parameter and return types

use std::fmt;
use std::sync::Arc;

/// Type a member declares for a parameter or its return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// No value (return types only)
    Void,
    /// `boolean`
    Bool,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `char`
    Char,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// The built-in `String` class
    Str,
    /// A registered class or interface, by name
    Class(Arc<str>),
    /// Accepts any value unchanged
    Any,
}

impl Type {
    /// Type for a class name. `"String"` maps to [`Type::Str`].
    pub fn class(name: impl AsRef<str>) -> Self {
        match name.as_ref() {
            "String" => Type::Str,
            other => Type::Class(Arc::from(other)),
        }
    }

    /// Check if this is a primitive type
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Type::Bool
                | Type::Byte
                | Type::Short
                | Type::Char
                | Type::Int
                | Type::Long
                | Type::Float
                | Type::Double
        )
    }

    /// Check if this is a numeric primitive (including `char`)
    pub fn is_numeric(&self) -> bool {
        self.is_primitive() && *self != Type::Bool
    }

    /// Check if values of this type may be `null`
    pub fn is_reference(&self) -> bool {
        matches!(self, Type::Str | Type::Class(_) | Type::Any)
    }

    /// Source-level name of the type
    pub fn name(&self) -> &str {
        match self {
            Type::Void => "void",
            Type::Bool => "boolean",
            Type::Byte => "byte",
            Type::Short => "short",
            Type::Char => "char",
            Type::Int => "int",
            Type::Long => "long",
            Type::Float => "float",
            Type::Double => "double",
            Type::Str => "String",
            Type::Class(name) => name,
            Type::Any => "any",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_class_is_str() {
        assert_eq!(Type::class("String"), Type::Str);
        assert_eq!(Type::class("Point"), Type::Class(Arc::from("Point")));
    }

    #[test]
    fn test_classification() {
        assert!(Type::Int.is_numeric());
        assert!(Type::Char.is_numeric());
        assert!(!Type::Bool.is_numeric());
        assert!(Type::Bool.is_primitive());
        assert!(Type::Any.is_reference());
        assert!(!Type::Void.is_reference());
    }
}
