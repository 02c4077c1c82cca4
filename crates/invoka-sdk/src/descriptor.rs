//! Member descriptors
//!
//! A `MemberDescriptor` names one executable member of a type: which type
//! declares it, its name and signature, and how a call to it is dispatched.
//! Descriptors are produced by whatever introspection facility the caller
//! uses and are never mutated by the engine.

use std::fmt;
use std::sync::Arc;

use crate::types::Type;

/// How a call reaches the member's implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchKind {
    /// Instance method of a concrete class, resolved against the receiver's class
    Virtual,
    /// Interface-declared method reached through an interface-typed receiver
    Interface,
    /// Static member, no receiver
    Static,
    /// Allocation plus initializer, no receiver
    Constructor,
}

impl DispatchKind {
    /// Check if calls of this kind take a receiver
    pub fn takes_receiver(self) -> bool {
        matches!(self, DispatchKind::Virtual | DispatchKind::Interface)
    }
}

/// Identifies the executable member to invoke
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberDescriptor {
    declaring_type: Arc<str>,
    name: Arc<str>,
    parameter_types: Arc<[Type]>,
    return_type: Type,
    dispatch_kind: DispatchKind,
}

impl MemberDescriptor {
    /// Create a descriptor from its parts.
    ///
    /// Constructors always have an empty name and return their declaring type.
    pub fn new(
        declaring_type: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        parameter_types: Vec<Type>,
        return_type: Type,
        dispatch_kind: DispatchKind,
    ) -> Self {
        let declaring_type = declaring_type.into();
        let (name, return_type) = if dispatch_kind == DispatchKind::Constructor {
            (Arc::from(""), Type::class(&*declaring_type))
        } else {
            (name.into(), return_type)
        };
        Self {
            declaring_type,
            name,
            parameter_types: parameter_types.into(),
            return_type,
            dispatch_kind,
        }
    }

    /// Instance method dispatched on the receiver's runtime class
    pub fn method(
        declaring_type: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        parameter_types: Vec<Type>,
        return_type: Type,
    ) -> Self {
        Self::new(declaring_type, name, parameter_types, return_type, DispatchKind::Virtual)
    }

    /// Interface method dispatched through an interface-typed receiver
    pub fn interface_method(
        declaring_type: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        parameter_types: Vec<Type>,
        return_type: Type,
    ) -> Self {
        Self::new(declaring_type, name, parameter_types, return_type, DispatchKind::Interface)
    }

    /// Static method
    pub fn static_method(
        declaring_type: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        parameter_types: Vec<Type>,
        return_type: Type,
    ) -> Self {
        Self::new(declaring_type, name, parameter_types, return_type, DispatchKind::Static)
    }

    /// Constructor of `declaring_type`
    pub fn constructor(declaring_type: impl Into<Arc<str>>, parameter_types: Vec<Type>) -> Self {
        Self::new(declaring_type, "", parameter_types, Type::Void, DispatchKind::Constructor)
    }

    /// Name of the declaring type
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// Member name (empty for constructors)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types in order
    pub fn parameter_types(&self) -> &[Type] {
        &self.parameter_types
    }

    /// Declared return type (the constructed type for constructors)
    pub fn return_type(&self) -> &Type {
        &self.return_type
    }

    /// Dispatch kind
    pub fn dispatch_kind(&self) -> DispatchKind {
        self.dispatch_kind
    }

    /// Check if the member is static (static methods and constructors)
    pub fn is_static(&self) -> bool {
        !self.dispatch_kind.takes_receiver()
    }

    /// Check if this describes a constructor
    pub fn is_constructor(&self) -> bool {
        self.dispatch_kind == DispatchKind::Constructor
    }

    /// Number of declared parameters
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Number of call slots: parameters plus one for the receiver of instance members
    pub fn slot_count(&self) -> usize {
        self.arity() + usize::from(self.dispatch_kind.takes_receiver())
    }
}

impl fmt::Display for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constructor() {
            write!(f, "{}.<init>(", self.declaring_type)?;
        } else {
            write!(f, "{}.{}(", self.declaring_type, self.name)?;
        }
        for (i, ty) in self.parameter_types.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}
