//! Invoka Engine - dynamic member invocation
//!
//! Turns a [`MemberDescriptor`] (a method or constructor of a registered
//! class) into a [`Callable`] that can be invoked any number of times, from
//! any thread, with type-erased [`Value`]s.
//!
//! # Backends
//!
//! A Callable runs on one of three interchangeable backends:
//!
//! - **Fixed-arity table**: one specialized entry per slot count up to
//!   [`ARITY_CAP`], bound to a pre-resolved handle
//! - **Generated adapter**: a uniquely named, single-purpose adapter emitted on
//!   first use, for instance members beyond the table
//! - **Reflective**: the registry's generic entry point, always available
//!
//! [`Preference::Recommended`] picks among them from the member's shape; an
//! explicit preference overrides it. All backends convert arguments with the
//! same rules and report failures through [`InvocationError`].
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use invoka_engine::{ClassRegistry, InvokeEngine, Preference};
//! use invoka_sdk::{MemberDescriptor, Type, Value};
//!
//! let engine = InvokeEngine::new(Arc::new(ClassRegistry::with_builtins()));
//! let parse = MemberDescriptor::static_method("Integer", "parseInt", vec![Type::Str], Type::Int);
//! let callable = engine.for_method(&parse, Preference::Recommended)?;
//! assert_eq!(callable.invoke(None, &[Value::from("42")])?, Value::Int(42));
//! ```

#![warn(missing_docs)]

mod adapter;
mod handle;
mod reflective;
mod table;

pub mod callable;
pub mod coerce;
pub mod config;
pub mod engine;
pub mod host;
pub mod select;

pub use callable::Callable;
pub use config::{ConfigError, EngineConfig};
pub use engine::InvokeEngine;
pub use host::{
    BuiltinError, ClassBuilder, ClassDef, ClassLookup, ClassRegistry, ConstructorDef, HostFault, MethodDef, RegistryError,
    Visibility,
};
pub use select::{select_backend, Backend, Preference};
pub use table::ARITY_CAP;

pub use invoka_sdk::{
    ArityMismatch, CoercionError, DirectError, DispatchKind, GenerationError, InvocationError, MemberDescriptor,
    ResolutionError, Slot, Thrown, Type, Value,
};
