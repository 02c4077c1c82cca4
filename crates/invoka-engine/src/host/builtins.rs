//! Built-in classes: `Object`, `String` and the boxed primitives

use invoka_sdk::{Thrown, Type, Value};

use super::class::ClassBuilder;
use super::registry::{ClassRegistry, OBJECT};

/// Errors raised by built-in members
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuiltinError {
    /// Index outside `0..length`
    #[error("index {index} out of bounds for length {length}")]
    IndexOutOfBounds {
        /// Requested index
        index: i64,
        /// Length of the indexed value
        length: usize,
    },

    /// String is not a number in the expected format
    #[error("For input string: \"{0}\"")]
    NumberFormat(String),

    /// `null` where a value was required
    #[error("null reference")]
    NullReference,
}

/// Register the built-in classes. Already registered classes are left alone.
pub(crate) fn install(registry: &ClassRegistry) {
    let classes = [
        object(),
        string(),
        integer(),
        long(),
        double(),
        ClassBuilder::new("Boolean"),
        ClassBuilder::new("Byte"),
        ClassBuilder::new("Short"),
        ClassBuilder::new("Character"),
        ClassBuilder::new("Float"),
    ];
    for class in classes {
        let name = class.name.clone();
        if let Err(err) = registry.register(class) {
            tracing::debug!(class = %name, error = %err, "skipping built-in class");
        }
    }
}

fn object() -> ClassBuilder {
    ClassBuilder::new(OBJECT)
        .constructor(vec![], |_| Ok(Vec::new()))
        .method("toString", vec![], Type::Str, |this, _| Ok(Value::string(this.to_string())))
        .method("equals", vec![Type::class(OBJECT)], Type::Bool, |this, args| {
            Ok(Value::Bool(args.first() == Some(this)))
        })
}

fn string() -> ClassBuilder {
    ClassBuilder::new("String")
        .method("length", vec![], Type::Int, |this, _| {
            Ok(Value::Int(length(text(this)?)))
        })
        .method("isEmpty", vec![], Type::Bool, |this, _| {
            Ok(Value::Bool(text(this)?.is_empty()))
        })
        .method("charAt", vec![Type::Int], Type::Char, |this, args| {
            let s = text(this)?;
            let index = int_arg(args, 0);
            usize::try_from(index)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(Value::Char)
                .ok_or_else(|| out_of_bounds(index as i64, s))
        })
        .method("concat", vec![Type::Str], Type::Str, |this, args| {
            let s = text(this)?;
            let other = args.first().map(text).transpose()?.unwrap_or_default();
            Ok(Value::string(format!("{}{}", s, other)))
        })
        .method("substring", vec![Type::Int, Type::Int], Type::Str, |this, args| {
            let s = text(this)?;
            let (begin, end) = (int_arg(args, 0), int_arg(args, 1));
            let len = length(s);
            if begin < 0 || end > len || begin > end {
                let index = if begin < 0 || begin > len { begin } else { end };
                return Err(out_of_bounds(index as i64, s));
            }
            let sub: String = s
                .chars()
                .skip(begin as usize)
                .take((end - begin) as usize)
                .collect();
            Ok(Value::string(sub))
        })
        .method("toString", vec![], Type::Str, |this, _| Ok(this.clone()))
}

fn integer() -> ClassBuilder {
    ClassBuilder::new("Integer")
        .static_method("parseInt", vec![Type::Str], Type::Int, |args| {
            let s = str_arg(args)?;
            s.parse::<i32>()
                .map(Value::Int)
                .map_err(|_| Thrown::new(BuiltinError::NumberFormat(s.to_string())))
        })
        .static_method("valueOf", vec![Type::Int], Type::class("Integer"), |args| {
            Ok(args.first().cloned().unwrap_or_default())
        })
        .method("intValue", vec![], Type::Int, |this, _| Ok(this.clone()))
}

fn long() -> ClassBuilder {
    ClassBuilder::new("Long").static_method("parseLong", vec![Type::Str], Type::Long, |args| {
        let s = str_arg(args)?;
        s.parse::<i64>()
            .map(Value::Long)
            .map_err(|_| Thrown::new(BuiltinError::NumberFormat(s.to_string())))
    })
}

fn double() -> ClassBuilder {
    ClassBuilder::new("Double").static_method("parseDouble", vec![Type::Str], Type::Double, |args| {
        let s = str_arg(args)?;
        s.trim()
            .parse::<f64>()
            .map(Value::Double)
            .map_err(|_| Thrown::new(BuiltinError::NumberFormat(s.to_string())))
    })
}

// Arguments reach member bodies already converted, so a wrong variant here
// can only mean `null`.

fn text(value: &Value) -> Result<&str, Thrown> {
    value
        .as_str()
        .ok_or_else(|| Thrown::new(BuiltinError::NullReference))
}

fn str_arg(args: &[Value]) -> Result<&str, Thrown> {
    args.first()
        .and_then(Value::as_str)
        .ok_or_else(|| Thrown::new(BuiltinError::NullReference))
}

fn int_arg(args: &[Value], index: usize) -> i32 {
    args.get(index).and_then(Value::as_i32).unwrap_or_default()
}

fn length(s: &str) -> i32 {
    i32::try_from(s.chars().count()).unwrap_or(i32::MAX)
}

fn out_of_bounds(index: i64, s: &str) -> Thrown {
    Thrown::new(BuiltinError::IndexOutOfBounds {
        index,
        length: s.chars().count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoka_sdk::MemberDescriptor;

    use crate::host::{ClassLookup, HostFault};

    fn call(registry: &ClassRegistry, desc: &MemberDescriptor, recv: Option<&Value>, args: &[Value]) -> Value {
        registry.invoke_member(desc, recv, args).unwrap()
    }

    #[test]
    fn test_builtins_registered() {
        let registry = ClassRegistry::with_builtins();
        for name in ["Object", "String", "Boolean", "Byte", "Short", "Character", "Integer", "Long", "Float", "Double"] {
            assert!(registry.contains(name), "{} missing", name);
        }
        assert!(registry.is_subclass_of("String", OBJECT));
    }

    #[test]
    fn test_string_members() {
        let registry = ClassRegistry::with_builtins();
        let hello = Value::from("hello");
        let length = MemberDescriptor::method("String", "length", vec![], Type::Int);
        assert_eq!(call(&registry, &length, Some(&hello), &[]), Value::Int(5));

        let char_at = MemberDescriptor::method("String", "charAt", vec![Type::Int], Type::Char);
        assert_eq!(call(&registry, &char_at, Some(&hello), &[Value::Int(1)]), Value::Char('e'));

        let concat = MemberDescriptor::method("String", "concat", vec![Type::Str], Type::Str);
        assert_eq!(
            call(&registry, &concat, Some(&hello), &[Value::from(" world")]),
            Value::from("hello world")
        );

        let substring = MemberDescriptor::method("String", "substring", vec![Type::Int, Type::Int], Type::Str);
        assert_eq!(
            call(&registry, &substring, Some(&hello), &[Value::Int(1), Value::Int(3)]),
            Value::from("el")
        );

        let is_empty = MemberDescriptor::method("String", "isEmpty", vec![], Type::Bool);
        assert_eq!(call(&registry, &is_empty, Some(&Value::from("")), &[]), Value::Bool(true));
    }

    #[test]
    fn test_inherited_object_members() {
        let registry = ClassRegistry::with_builtins();
        let to_string = MemberDescriptor::method(OBJECT, "toString", vec![], Type::Str);
        assert_eq!(call(&registry, &to_string, Some(&Value::Int(42)), &[]), Value::from("42"));
        assert_eq!(call(&registry, &to_string, Some(&Value::from("s")), &[]), Value::from("s"));

        let equals = MemberDescriptor::method(OBJECT, "equals", vec![Type::class(OBJECT)], Type::Bool);
        assert_eq!(
            call(&registry, &equals, Some(&Value::Int(1)), &[Value::Int(1)]),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_char_at_out_of_bounds() {
        let registry = ClassRegistry::with_builtins();
        let char_at = MemberDescriptor::method("String", "charAt", vec![Type::Int], Type::Char);
        match registry.invoke_member(&char_at, Some(&Value::from("ab")), &[Value::Int(5)]) {
            Err(HostFault::Target(thrown)) => assert_eq!(
                thrown.downcast_ref::<BuiltinError>(),
                Some(&BuiltinError::IndexOutOfBounds { index: 5, length: 2 })
            ),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_numbers() {
        let registry = ClassRegistry::with_builtins();
        let parse_int = MemberDescriptor::static_method("Integer", "parseInt", vec![Type::Str], Type::Int);
        assert_eq!(call(&registry, &parse_int, None, &[Value::from("42")]), Value::Int(42));
        let parse_long = MemberDescriptor::static_method("Long", "parseLong", vec![Type::Str], Type::Long);
        assert_eq!(call(&registry, &parse_long, None, &[Value::from("-7")]), Value::Long(-7));
        let parse_double =
            MemberDescriptor::static_method("Double", "parseDouble", vec![Type::Str], Type::Double);
        assert_eq!(call(&registry, &parse_double, None, &[Value::from("2.5")]), Value::Double(2.5));
    }
}
