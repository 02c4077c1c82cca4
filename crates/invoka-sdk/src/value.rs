//! Type-erased carrier for arguments, receivers and results
//!
//! Primitives are stored inline ("boxed" into the enum), strings are shared
//! `Arc<str>` slices and objects are reference-counted [`Instance`]s.
//!
//! # Equality
//!
//! Floating point payloads compare by bit pattern, so `NaN == NaN` and
//! `0.0 != -0.0`. This is the identity the engine uses when it claims two
//! dispatch paths produced the same result.

use std::fmt;
use std::sync::Arc;

/// Type-erased value passed to and returned from a Callable.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent reference (also the result of `void` members)
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// 8-bit signed integer
    Byte(i8),
    /// 16-bit signed integer
    Short(i16),
    /// Unicode scalar value
    Char(char),
    /// 32-bit signed integer
    Int(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit float
    Float(f32),
    /// 64-bit float
    Double(f64),
    /// Immutable string
    Str(Arc<str>),
    /// Heap object
    Object(Arc<Instance>),
}

impl Value {
    /// Create a string value
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Allocate a new object value
    pub fn object(class: impl Into<Arc<str>>, fields: Vec<Value>) -> Self {
        Value::Object(Arc::new(Instance::new(class, fields)))
    }

    /// Check if this is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a primitive (not null, string or object)
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Null | Value::Str(_) | Value::Object(_))
    }

    /// Get as boolean if this is a bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i32 if this is an `Int`
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as i64 if this is a `Long`
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a `Double`
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as string slice if this is a `Str`
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the object if this is an `Object`
    pub fn as_object(&self) -> Option<&Arc<Instance>> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Runtime class name of this value.
    ///
    /// Primitives report their boxed class (`Integer`, `Double`, ...),
    /// strings report `String` and objects report their instance class.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "Boolean",
            Value::Byte(_) => "Byte",
            Value::Short(_) => "Short",
            Value::Char(_) => "Character",
            Value::Int(_) => "Integer",
            Value::Long(_) => "Long",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::Str(_) => "String",
            Value::Object(obj) => obj.class_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Byte(i) => write!(f, "Byte({})", i),
            Value::Short(i) => write!(f, "Short({})", i),
            Value::Char(c) => write!(f, "Char({:?})", c),
            Value::Int(i) => write!(f, "Int({})", i),
            Value::Long(i) => write!(f, "Long({})", i),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::Double(x) => write!(f, "Double({})", x),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Object(obj) => write!(f, "{:?}", obj),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Byte(i) => write!(f, "{}", i),
            Value::Short(i) => write!(f, "{}", i),
            Value::Char(c) => write!(f, "{}", c),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Double(x) => write!(f, "{}", x),
            Value::Str(s) => write!(f, "{}", s),
            Value::Object(obj) => write!(f, "{}@{:p}", obj.class_name(), Arc::as_ptr(obj)),
        }
    }
}

// ============================================================================
// Conversions
// ============================================================================

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    char => Char,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    Arc<str> => Str,
    Arc<Instance> => Object,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// ============================================================================
// Instance
// ============================================================================

/// A heap object: its runtime class name and its field values.
///
/// Instances are immutable once allocated; constructors produce a fresh
/// instance with all fields initialized.
#[derive(Clone, PartialEq)]
pub struct Instance {
    class: Arc<str>,
    fields: Box<[Value]>,
}

impl Instance {
    /// Create a new instance of `class` holding `fields`
    pub fn new(class: impl Into<Arc<str>>, fields: Vec<Value>) -> Self {
        Self {
            class: class.into(),
            fields: fields.into_boxed_slice(),
        }
    }

    /// Runtime class name
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// Shared handle to the runtime class name
    pub fn class(&self) -> &Arc<str> {
        &self.class
    }

    /// Field value by index
    pub fn field(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    /// All field values in declaration order
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class)
            .field("fields", &self.fields)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_equality_is_bitwise() {
        assert_eq!(Value::Double(f64::NAN), Value::Double(f64::NAN));
        assert_ne!(Value::Double(0.0), Value::Double(-0.0));
        assert_ne!(Value::Float(1.0), Value::Double(1.0));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Int(1).type_name(), "Integer");
        assert_eq!(Value::from("x").type_name(), "String");
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::object("Pair", vec![]).type_name(), "Pair");
    }

    #[test]
    fn test_object_equality() {
        let a = Value::object("Pair", vec![Value::Int(3), Value::Int(4)]);
        let b = Value::object("Pair", vec![Value::Int(3), Value::Int(4)]);
        let c = Value::object("Pair", vec![Value::Int(4), Value::Int(3)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(7i64)), Value::Long(7));
    }
}
