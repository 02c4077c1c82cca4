//! Invoka SDK - shared types for the dynamic invocation engine
//!
//! This crate holds what callers of the engine need to talk to it without
//! depending on the engine itself: the type-erased [`Value`], declared
//! [`Type`]s, the [`MemberDescriptor`] naming a method or constructor, and the
//! error taxonomy every Callable reports through.
//!
//! # Example
//!
//! ```ignore
//! use invoka_sdk::{MemberDescriptor, Type, Value};
//!
//! let length = MemberDescriptor::method("String", "length", vec![], Type::Int);
//! let callable = engine.for_method(&length, Preference::Recommended)?;
//! assert_eq!(callable.invoke(Some(&Value::from("hello")), &[])?, Value::Int(5));
//! ```

#![warn(missing_docs)]

pub mod descriptor;
pub mod error;
pub mod types;
pub mod value;

pub use descriptor::{DispatchKind, MemberDescriptor};
pub use error::{
    ArityMismatch, CoercionError, DirectError, GenerationError, InvocationError, MemberFailure,
    ResolutionError, Slot, Thrown,
};
pub use types::Type;
pub use value::{Instance, Value};
