//! Host introspection facility
//!
//! Classes, their members and the generic reflective entry point the
//! engine's backends are built on top of.

pub mod builtins;
pub mod class;
pub mod registry;

pub use builtins::BuiltinError;
pub use class::{ClassBuilder, ClassDef, ConstructorDef, InitBody, MethodDef, MethodKey, NativeBody, Visibility};
pub use registry::{ClassLookup, ClassRegistry, HostFault, RegistryError, OBJECT};
