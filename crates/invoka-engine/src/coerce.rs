//! Argument coercion
//!
//! Converts a runtime [`Value`] to the exact type a parameter declares. Every
//! backend goes through these functions, so the conversion rules are the same
//! no matter which dispatch path a Callable uses:
//!
//! - `null` converts to reference types only
//! - numeric values (including `char`) convert between each other; widening
//!   always succeeds (integral to floating point rounds to nearest), narrowing
//!   only in range and without fractional loss
//! - objects convert to a class or interface when their runtime class is
//!   assignable

use std::sync::Arc;

use invoka_sdk::{CoercionError, Type, Value};

use crate::host::ClassLookup;

/// Lower bound of the `i64` range as an `f64`
const I64_MIN_F: f64 = -9_223_372_036_854_775_808.0;
/// Exclusive upper bound of the `i64` range as an `f64`
const I64_END_F: f64 = 9_223_372_036_854_775_808.0;

/// Convert `value` to `target`
pub fn convert(target: &Type, value: &Value, classes: &dyn ClassLookup) -> Result<Value, CoercionError> {
    match target {
        Type::Str => to_str(value),
        Type::Class(name) => to_class(value, name, classes),
        Type::Any => Ok(value.clone()),
        Type::Void => to_void(value),
        primitive => primitive_converter(primitive)
            .map(|convert| convert(value))
            .unwrap_or_else(|| Err(mismatch(value, target))),
    }
}

// ============================================================================
// Converter
// ============================================================================

/// Conversion specialized for one declared type, chosen once when a handle
/// or adapter is built.
#[derive(Debug, Clone)]
pub enum Converter {
    /// Primitive target: a direct function, no type dispatch per call
    Primitive(fn(&Value) -> Result<Value, CoercionError>),
    /// `String`
    Str,
    /// Class or interface, checked against the registry
    Class(Arc<str>),
    /// Pass-through
    Any,
}

impl Converter {
    /// Pick the converter for a declared parameter type
    pub fn for_type(ty: &Type) -> Self {
        match ty {
            Type::Str => Converter::Str,
            Type::Class(name) => Converter::Class(name.clone()),
            Type::Any => Converter::Any,
            Type::Void => Converter::Primitive(to_void),
            primitive => primitive_converter(primitive)
                .map(Converter::Primitive)
                .unwrap_or(Converter::Any),
        }
    }

    /// Apply the conversion
    #[inline]
    pub fn apply(&self, value: &Value, classes: &dyn ClassLookup) -> Result<Value, CoercionError> {
        match self {
            Converter::Primitive(convert) => convert(value),
            Converter::Str => to_str(value),
            Converter::Class(name) => to_class(value, name, classes),
            Converter::Any => Ok(value.clone()),
        }
    }
}

fn primitive_converter(ty: &Type) -> Option<fn(&Value) -> Result<Value, CoercionError>> {
    let convert: fn(&Value) -> Result<Value, CoercionError> = match ty {
        Type::Bool => to_bool,
        Type::Byte => to_byte,
        Type::Short => to_short,
        Type::Char => to_char,
        Type::Int => to_int,
        Type::Long => to_long,
        Type::Float => to_float,
        Type::Double => to_double,
        _ => return None,
    };
    Some(convert)
}

// ============================================================================
// Numeric conversions
// ============================================================================

/// Numeric view of a primitive value
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn numeric(value: &Value) -> Option<Num> {
    match value {
        Value::Byte(i) => Some(Num::Int(*i as i64)),
        Value::Short(i) => Some(Num::Int(*i as i64)),
        Value::Char(c) => Some(Num::Int(*c as u32 as i64)),
        Value::Int(i) => Some(Num::Int(*i as i64)),
        Value::Long(i) => Some(Num::Int(*i)),
        Value::Float(f) => Some(Num::Float(*f as f64)),
        Value::Double(f) => Some(Num::Float(*f)),
        _ => None,
    }
}

/// Integral value of `f` if it is finite, whole and inside the `i64` range
fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && (I64_MIN_F..I64_END_F).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn as_integer(value: &Value, target: Type) -> Result<i64, CoercionError> {
    match numeric(value) {
        Some(Num::Int(i)) => Ok(i),
        Some(Num::Float(f)) => integral(f).ok_or_else(|| out_of_range(value, target)),
        None => Err(not_numeric(value, target)),
    }
}

fn to_byte(value: &Value) -> Result<Value, CoercionError> {
    if let Value::Byte(_) = value {
        return Ok(value.clone());
    }
    let i = as_integer(value, Type::Byte)?;
    i8::try_from(i)
        .map(Value::Byte)
        .map_err(|_| out_of_range(value, Type::Byte))
}

fn to_short(value: &Value) -> Result<Value, CoercionError> {
    if let Value::Short(_) = value {
        return Ok(value.clone());
    }
    let i = as_integer(value, Type::Short)?;
    i16::try_from(i)
        .map(Value::Short)
        .map_err(|_| out_of_range(value, Type::Short))
}

fn to_char(value: &Value) -> Result<Value, CoercionError> {
    if let Value::Char(_) = value {
        return Ok(value.clone());
    }
    let i = as_integer(value, Type::Char)?;
    u32::try_from(i)
        .ok()
        .and_then(char::from_u32)
        .map(Value::Char)
        .ok_or_else(|| out_of_range(value, Type::Char))
}

fn to_int(value: &Value) -> Result<Value, CoercionError> {
    if let Value::Int(_) = value {
        return Ok(value.clone());
    }
    let i = as_integer(value, Type::Int)?;
    i32::try_from(i)
        .map(Value::Int)
        .map_err(|_| out_of_range(value, Type::Int))
}

fn to_long(value: &Value) -> Result<Value, CoercionError> {
    if let Value::Long(_) = value {
        return Ok(value.clone());
    }
    as_integer(value, Type::Long).map(Value::Long)
}

fn to_float(value: &Value) -> Result<Value, CoercionError> {
    match numeric(value) {
        Some(Num::Float(f)) => {
            let narrowed = f as f32;
            if f.is_nan() || narrowed as f64 == f {
                Ok(Value::Float(narrowed))
            } else {
                Err(out_of_range(value, Type::Float))
            }
        }
        // Integral to floating point widens with rounding to nearest.
        Some(Num::Int(i)) => Ok(Value::Float(i as f32)),
        None => Err(not_numeric(value, Type::Float)),
    }
}

fn to_double(value: &Value) -> Result<Value, CoercionError> {
    match numeric(value) {
        Some(Num::Float(f)) => Ok(Value::Double(f)),
        Some(Num::Int(i)) => Ok(Value::Double(i as f64)),
        None => Err(not_numeric(value, Type::Double)),
    }
}

// ============================================================================
// Non-numeric conversions
// ============================================================================

fn to_bool(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Null => Err(CoercionError::NullToPrimitive { target: Type::Bool }),
        other => Err(mismatch(other, &Type::Bool)),
    }
}

fn to_str(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Str(_) | Value::Null => Ok(value.clone()),
        other => Err(mismatch(other, &Type::Str)),
    }
}

fn to_void(value: &Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null => Ok(Value::Null),
        other => Err(mismatch(other, &Type::Void)),
    }
}

/// Checked downcast to a class or interface
fn to_class(value: &Value, class: &Arc<str>, classes: &dyn ClassLookup) -> Result<Value, CoercionError> {
    match value {
        Value::Null => Ok(Value::Null),
        _ if &**class == "Object" || value.type_name() == &**class => Ok(value.clone()),
        Value::Object(obj) => {
            if classes.is_subclass_of(obj.class_name(), class) {
                Ok(value.clone())
            } else {
                Err(CoercionError::NotAssignable {
                    class: obj.class_name().to_string(),
                    target: Type::Class(class.clone()),
                })
            }
        }
        other => Err(mismatch(other, &Type::Class(class.clone()))),
    }
}

// ============================================================================
// Errors
// ============================================================================

fn mismatch(value: &Value, target: &Type) -> CoercionError {
    match value {
        Value::Null if target.is_primitive() => CoercionError::NullToPrimitive {
            target: target.clone(),
        },
        _ => CoercionError::Mismatch {
            found: value.type_name().to_string(),
            target: target.clone(),
        },
    }
}

fn not_numeric(value: &Value, target: Type) -> CoercionError {
    mismatch(value, &target)
}

fn out_of_range(value: &Value, target: Type) -> CoercionError {
    CoercionError::OutOfRange {
        value: value.to_string(),
        target,
    }
}
