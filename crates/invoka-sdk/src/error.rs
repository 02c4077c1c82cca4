//! Error types surfaced by the invocation engine
//!
//! Construction failures are [`ResolutionError`]s; every failure of a call is
//! an [`InvocationError`] whose `source()` chain reaches the original cause.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::types::Type;

// ============================================================================
// Thrown
// ============================================================================

/// An error raised by the invoked member itself.
///
/// The wrapped error object is shared, never copied, so callers can check
/// identity with [`Thrown::same_as`] or inspect it with [`Thrown::downcast_ref`].
#[derive(Clone)]
pub struct Thrown(Arc<dyn Error + Send + Sync + 'static>);

/// Plain-message failure for members that do not define their own error type
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct MemberFailure(pub String);

impl Thrown {
    /// Wrap an error raised by a member
    pub fn new(err: impl Error + Send + Sync + 'static) -> Self {
        Thrown(Arc::new(err))
    }

    /// Raise a plain message
    pub fn msg(message: impl Into<String>) -> Self {
        Thrown::new(MemberFailure(message.into()))
    }

    /// Wrap an already shared error object without re-allocating it
    pub fn from_arc(err: Arc<dyn Error + Send + Sync + 'static>) -> Self {
        Thrown(err)
    }

    /// The raised error object
    pub fn get(&self) -> &(dyn Error + Send + Sync + 'static) {
        &*self.0
    }

    /// Shared handle to the raised error object
    pub fn as_arc(&self) -> &Arc<dyn Error + Send + Sync + 'static> {
        &self.0
    }

    /// Downcast the raised error to a concrete type
    pub fn downcast_ref<T: Error + 'static>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Check if both wrap the same error object
    pub fn same_as(&self, other: &Thrown) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Thrown").field(&self.0).finish()
    }
}

impl fmt::Display for Thrown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.0, f)
    }
}

impl Error for Thrown {
    /// The raised error object itself, so chain walks reach it
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&*self.0)
    }
}

// ============================================================================
// Invocation errors
// ============================================================================

/// Argument count does not match the declared parameter count
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} arguments, got {found}")]
pub struct ArityMismatch {
    /// Declared parameter count
    pub expected: usize,
    /// Supplied argument count
    pub found: usize,
}

/// A runtime value cannot be converted to a declared type
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoercionError {
    /// `null` passed where a primitive is declared
    #[error("null cannot be converted to {target}")]
    NullToPrimitive {
        /// Declared type
        target: Type,
    },

    /// Numeric value does not fit the declared type exactly
    #[error("{value} is out of range for {target}")]
    OutOfRange {
        /// Rendered source value
        value: String,
        /// Declared type
        target: Type,
    },

    /// Object whose class is not assignable to the declared type
    #[error("{class} is not assignable to {target}")]
    NotAssignable {
        /// Runtime class of the value
        class: String,
        /// Declared type
        target: Type,
    },

    /// No conversion exists between the value and the declared type
    #[error("{found} cannot be converted to {target}")]
    Mismatch {
        /// Runtime type of the value
        found: String,
        /// Declared type
        target: Type,
    },
}

/// Call position a coercion failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The receiver
    Receiver,
    /// Positional argument by index
    Argument(usize),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Receiver => f.write_str("receiver"),
            Slot::Argument(i) => write!(f, "argument {}", i),
        }
    }
}

/// The single error type returned by `Callable::invoke`
#[derive(Debug, Clone, thiserror::Error)]
pub enum InvocationError {
    /// Wrong number of arguments
    #[error("Arity mismatch: {0}")]
    ArityMismatch(#[from] ArityMismatch),

    /// An argument or the receiver could not be converted
    #[error("Cannot convert {slot}: {source}")]
    Coercion {
        /// Failing position
        slot: Slot,
        /// Underlying conversion failure
        #[source]
        source: CoercionError,
    },

    /// Instance member called without a receiver
    #[error("Missing receiver for {0}")]
    MissingReceiver(String),

    /// Static member or constructor called with a receiver
    #[error("Unexpected receiver for {0}")]
    UnexpectedReceiver(String),

    /// The receiver's class has no implementation of an abstract member
    #[error("No implementation of {member} in {class}")]
    Unimplemented {
        /// Rendered member descriptor
        member: String,
        /// Runtime class of the receiver
        class: String,
    },

    /// The member itself raised an error
    #[error("Member raised: {0}")]
    Target(#[source] Thrown),

    /// Backend-internal failure
    #[error("Backend failure: {0}")]
    Backend(String),
}

impl InvocationError {
    /// Wrap a coercion failure at `slot`
    pub fn coercion(slot: Slot, source: CoercionError) -> Self {
        InvocationError::Coercion { slot, source }
    }

    /// The error raised by the member, if that is what failed
    pub fn thrown(&self) -> Option<&Thrown> {
        match self {
            InvocationError::Target(thrown) => Some(thrown),
            _ => None,
        }
    }

    /// The coercion failure, if that is what failed
    pub fn coercion_error(&self) -> Option<&CoercionError> {
        match self {
            InvocationError::Coercion { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Check if the caller supplied the wrong number of arguments
    pub fn is_arity_mismatch(&self) -> bool {
        matches!(self, InvocationError::ArityMismatch(_))
    }
}

/// Error returned by `Callable::invoke_direct`
///
/// A member's own failure comes back as itself; anything else is the
/// engine's [`InvocationError`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectError {
    /// The member raised this error
    #[error(transparent)]
    Thrown(Thrown),

    /// The engine failed before or around the call
    #[error(transparent)]
    Invocation(InvocationError),
}

impl From<InvocationError> for DirectError {
    fn from(err: InvocationError) -> Self {
        match err {
            InvocationError::Target(thrown) => DirectError::Thrown(thrown),
            other => DirectError::Invocation(other),
        }
    }
}

// ============================================================================
// Construction errors
// ============================================================================

/// Runtime type synthesis is unavailable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The environment forbids generating adapters
    #[error("adapter generation is disabled; cannot generate adapter for {member}")]
    Forbidden {
        /// Rendered member descriptor
        member: String,
    },

    /// The generated adapter could not be loaded into its unit
    #[error("cannot load adapter {name}: {reason}")]
    Load {
        /// Adapter name
        name: String,
        /// Failure description
        reason: String,
    },
}

/// A member descriptor cannot be turned into a Callable
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// Declaring type is not registered
    #[error("Unknown type: {0}")]
    UnknownType(String),

    /// No member with this name and signature
    #[error("No such member: {0}")]
    NoSuchMember(String),

    /// Member exists but is not accessible
    #[error("Member {member} is {visibility}")]
    Inaccessible {
        /// Rendered member descriptor
        member: String,
        /// Declared visibility
        visibility: String,
    },

    /// Construct cannot be invoked (abstract class, interface constructor, ...)
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Descriptor disagrees with the live type
    #[error("Inconsistent descriptor: {0}")]
    Inconsistent(String),

    /// Adapter generation failed
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn test_thrown_identity_survives_wrapping() {
        let thrown = Thrown::new(Boom);
        let err = InvocationError::Target(thrown.clone());
        assert!(err.thrown().unwrap().same_as(&thrown));
        assert!(err.thrown().unwrap().downcast_ref::<Boom>().is_some());
        assert_eq!(err.to_string(), "Member raised: boom");
    }

    #[test]
    fn test_source_chain_reaches_thrown_error() {
        let err = InvocationError::Target(Thrown::new(Boom));
        let mut next: Option<&(dyn Error + 'static)> = Some(&err);
        let mut found = false;
        while let Some(current) = next {
            found |= current.downcast_ref::<Boom>().is_some();
            next = current.source();
        }
        assert!(found);
    }

    #[test]
    fn test_source_chain_reaches_coercion() {
        let err = InvocationError::coercion(
            Slot::Argument(2),
            CoercionError::NullToPrimitive { target: Type::Int },
        );
        let source = err.source().unwrap();
        assert!(source.downcast_ref::<CoercionError>().is_some());
        assert_eq!(err.to_string(), "Cannot convert argument 2: null cannot be converted to int");
    }

    #[test]
    fn test_direct_error_unwraps_target() {
        let thrown = Thrown::msg("bad input");
        match DirectError::from(InvocationError::Target(thrown.clone())) {
            DirectError::Thrown(t) => assert!(t.same_as(&thrown)),
            other => panic!("unexpected {:?}", other),
        }
        let arity = InvocationError::from(ArityMismatch { expected: 3, found: 2 });
        assert!(matches!(DirectError::from(arity), DirectError::Invocation(_)));
    }
}
