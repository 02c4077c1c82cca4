//! Callable facade
//!
//! The one abstraction handed to the rest of the system. A `Callable` hides
//! which backend runs underneath and reports every failure as a single
//! [`InvocationError`].

use std::fmt;
use std::sync::Arc;

use invoka_sdk::{DirectError, InvocationError, Value};
use once_cell::sync::Lazy;

use crate::select::Backend;

/// A backend implementing the call contract for one member
pub(crate) trait Invoker: Send + Sync {
    /// Perform the call
    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvocationError>;

    /// Which backend this is
    fn backend(&self) -> Backend;

    /// Name of the generated adapter in use, once there is one
    fn adapter_name(&self) -> Option<Arc<str>> {
        None
    }
}

/// No-op backend behind [`Callable::empty`]
struct EmptyInvoker;

impl Invoker for EmptyInvoker {
    fn invoke(&self, _receiver: Option<&Value>, _args: &[Value]) -> Result<Value, InvocationError> {
        Ok(Value::Null)
    }

    fn backend(&self) -> Backend {
        Backend::Empty
    }
}

static EMPTY: Lazy<Callable> = Lazy::new(|| Callable::from_invoker(EmptyInvoker));

/// Uniform, backend-hiding invocation of one member.
///
/// Immutable once built and safe to invoke from any number of threads.
/// Cloning is cheap and shares the backend.
#[derive(Clone)]
pub struct Callable {
    invoker: Arc<dyn Invoker>,
}

impl Callable {
    pub(crate) fn from_invoker(invoker: impl Invoker + 'static) -> Self {
        Self {
            invoker: Arc::new(invoker),
        }
    }

    /// Invoke the member.
    ///
    /// `receiver` must be present exactly for instance members, and `args`
    /// must match the declared parameter count.
    #[inline]
    pub fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvocationError> {
        self.invoker.invoke(receiver, args)
    }

    /// Invoke the member, returning its own error when it raised one.
    ///
    /// Failures of the engine itself still arrive as [`DirectError::Invocation`].
    pub fn invoke_direct(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, DirectError> {
        self.invoke(receiver, args).map_err(DirectError::from)
    }

    /// Shared callable that ignores its inputs and returns `Null`.
    ///
    /// Every call returns a handle to the same instance.
    pub fn empty() -> Callable {
        EMPTY.clone()
    }

    /// Check if two callables share the same backend instance
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.invoker, &other.invoker)
    }

    #[doc(hidden)]
    pub fn backend(&self) -> Backend {
        self.invoker.backend()
    }

    #[doc(hidden)]
    pub fn adapter_name(&self) -> Option<Arc<str>> {
        self.invoker.adapter_name()
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("backend", &self.invoker.backend())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoka_sdk::Thrown;

    struct Failing(Thrown);

    impl Invoker for Failing {
        fn invoke(&self, _: Option<&Value>, _: &[Value]) -> Result<Value, InvocationError> {
            Err(InvocationError::Target(self.0.clone()))
        }

        fn backend(&self) -> Backend {
            Backend::Reflective
        }
    }

    #[test]
    fn test_empty_is_shared() {
        let a = Callable::empty();
        let b = Callable::empty();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.backend(), Backend::Empty);
        assert_eq!(a.invoke(Some(&Value::Int(1)), &[Value::Null, Value::Int(2)]).unwrap(), Value::Null);
        assert_eq!(a.invoke(None, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_invoke_direct_surfaces_thrown() {
        let thrown = Thrown::msg("raised");
        let callable = Callable::from_invoker(Failing(thrown.clone()));
        match callable.invoke_direct(None, &[]) {
            Err(DirectError::Thrown(t)) => assert!(t.same_as(&thrown)),
            other => panic!("unexpected {:?}", other),
        }
        assert!(callable.invoke(None, &[]).unwrap_err().thrown().is_some());
    }

    #[test]
    fn test_callable_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Callable>();
    }
}
