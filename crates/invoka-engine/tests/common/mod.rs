//! Shared fixture classes for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use invoka_engine::{ClassBuilder, ClassRegistry, InvokeEngine, MethodDef, Preference, Visibility};
use invoka_sdk::{Thrown, Type, Value};

/// Highest parameter count of the `Arity` fixture members
pub const MAX_FIXTURE_ARITY: usize = 20;

/// Every explicit backend preference
pub const ALL_PREFERENCES: [Preference; 4] = [
    Preference::Recommended,
    Preference::FixedArity,
    Preference::Generated,
    Preference::Reflective,
];

/// Position-weighted sum: `base + sum((i + 1) * args[i])`
pub fn weighted_sum(base: i64, args: &[Value]) -> i64 {
    args.iter()
        .enumerate()
        .map(|(i, v)| (i as i64 + 1) * v.as_i64().unwrap_or(0))
        .fold(base, |acc, x| acc + x)
}

fn field_i64(this: &Value, index: usize) -> i64 {
    this.as_object()
        .and_then(|o| o.field(index))
        .and_then(Value::as_i64)
        .unwrap_or(0)
}

/// Registry with the built-ins plus the fixture classes:
///
/// - `Pair(int, int)` with `first()` / `second()`
/// - `Arity(long)` with `s{n}` static and `i{n}` instance members taking `n`
///   `long` parameters, for every `n` up to [`MAX_FIXTURE_ARITY`]
/// - `Wide.join` taking 20 `int` parameters and returning them comma-separated
/// - `Shape` interface, `Rect` and `Square` implementations, abstract `Figure`
/// - `Vault` with a private method and a private constructor
/// - `Faulty` whose members raise the given error
pub fn registry(fault: Thrown) -> Arc<ClassRegistry> {
    let registry = ClassRegistry::with_builtins();

    registry
        .register(
            ClassBuilder::new("Pair")
                .constructor(vec![Type::Int, Type::Int], |args| Ok(args.to_vec()))
                .method("first", vec![], Type::Int, |this, _| {
                    Ok(this.as_object().and_then(|o| o.field(0)).cloned().unwrap_or_default())
                })
                .method("second", vec![], Type::Int, |this, _| {
                    Ok(this.as_object().and_then(|o| o.field(1)).cloned().unwrap_or_default())
                }),
        )
        .unwrap();

    let mut arity = ClassBuilder::new("Arity").constructor(vec![Type::Long], |args| Ok(args.to_vec()));
    for n in 0..=MAX_FIXTURE_ARITY {
        arity = arity
            .static_method(format!("s{}", n), vec![Type::Long; n], Type::Long, |args| {
                Ok(Value::Long(weighted_sum(0, args)))
            })
            .method(format!("i{}", n), vec![Type::Long; n], Type::Long, |this, args| {
                Ok(Value::Long(weighted_sum(field_i64(this, 0), args)))
            });
    }
    registry.register(arity).unwrap();

    registry
        .register(ClassBuilder::new("Wide").constructor(vec![], |_| Ok(vec![])).method(
            "join",
            vec![Type::Int; 20],
            Type::Str,
            |_, args| {
                let parts: Vec<String> = args.iter().map(Value::to_string).collect();
                Ok(Value::from(parts.join(",")))
            },
        ))
        .unwrap();

    registry
        .register(
            ClassBuilder::interface("Shape")
                .abstract_method("area", vec![], Type::Double)
                .method("name", vec![], Type::Str, |_, _| Ok(Value::from("shape"))),
        )
        .unwrap();
    registry
        .register(
            ClassBuilder::new("Rect")
                .implements("Shape")
                .constructor(vec![Type::Double, Type::Double], |args| Ok(args.to_vec()))
                .method("area", vec![], Type::Double, |this, _| {
                    let obj = this.as_object();
                    let w = obj.and_then(|o| o.field(0)).and_then(Value::as_f64).unwrap_or(0.0);
                    let h = obj.and_then(|o| o.field(1)).and_then(Value::as_f64).unwrap_or(0.0);
                    Ok(Value::Double(w * h))
                }),
        )
        .unwrap();
    registry
        .register(
            ClassBuilder::new("Square")
                .extends("Rect")
                .constructor(vec![Type::Double], |args| Ok(vec![args[0].clone(), args[0].clone()]))
                .method("name", vec![], Type::Str, |_, _| Ok(Value::from("square"))),
        )
        .unwrap();
    registry
        .register(
            ClassBuilder::new("Figure")
                .abstract_class()
                .implements("Shape")
                .constructor(vec![], |_| Ok(vec![])),
        )
        .unwrap();

    registry
        .register(
            ClassBuilder::new("Vault")
                .constructor(vec![], |_| Ok(vec![]))
                .define_constructor(
                    invoka_engine::ConstructorDef::new(vec![Type::Str], |args| Ok(args.to_vec()))
                        .with_visibility(Visibility::Private),
                )
                .define(
                    MethodDef::instance("secret", vec![], Type::Str, |_, _| Ok(Value::from("s3cr3t")))
                        .with_visibility(Visibility::Private),
                )
                .define(
                    MethodDef::static_fn("audit", vec![], Type::Void, |_| Ok(Value::Null))
                        .with_visibility(Visibility::Protected),
                ),
        )
        .unwrap();

    let (raise, raise_ctor) = (fault.clone(), fault);
    registry
        .register(
            ClassBuilder::new("Faulty")
                .constructor(vec![Type::Int], move |_| Err(raise_ctor.clone()))
                .static_method("fail", vec![Type::Int], Type::Void, move |_| Err(raise.clone()))
                .method("touch", vec![], Type::Void, |_, _| Ok(Value::from("discarded"))),
        )
        .unwrap();

    Arc::new(registry)
}

/// Engine over [`registry`] with the default configuration
pub fn engine() -> InvokeEngine {
    InvokeEngine::new(registry(Thrown::msg("fixture failure")))
}

/// Arguments `1..=n` as `Int` values
pub fn ints(n: usize) -> Vec<Value> {
    (1..=n as i32).map(Value::Int).collect()
}
