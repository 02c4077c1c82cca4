//! Reflective fallback
//!
//! Calls through the host's generic reflective entry point (the same one
//! behind [`ClassRegistry::invoke_member`](crate::ClassRegistry::invoke_member)).
//! The member is looked up, access-checked and its arguments converted on
//! every call. Lookups go through a registry snapshot, so they do not contend
//! with registration.

use invoka_sdk::{InvocationError, MemberDescriptor, Value};

use crate::callable::Invoker;
use crate::host::registry::{invoke_reflective, ClassView};
use crate::host::HostFault;
use crate::select::Backend;

/// Callable backend over the generic reflective entry point
#[derive(Debug)]
pub(crate) struct ReflectiveInvoker {
    descriptor: MemberDescriptor,
    classes: ClassView,
}

impl ReflectiveInvoker {
    pub(crate) fn new(descriptor: MemberDescriptor, classes: ClassView) -> Self {
        Self { descriptor, classes }
    }
}

impl Invoker for ReflectiveInvoker {
    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvocationError> {
        invoke_reflective(&self.classes, &self.descriptor, receiver, args).map_err(unwrap_fault)
    }

    fn backend(&self) -> Backend {
        Backend::Reflective
    }
}

/// Collapse the host's fault indirection into the single call error
fn unwrap_fault(fault: HostFault) -> InvocationError {
    match fault {
        HostFault::Target(thrown) => InvocationError::Target(thrown),
        HostFault::Illegal(err) => err,
        HostFault::Access(err) => InvocationError::Backend(format!("member no longer resolvable: {}", err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use invoka_sdk::{ResolutionError, Thrown, Type};

    use crate::host::{ClassBuilder, ClassRegistry};

    #[test]
    fn test_unwrap_fault_keeps_thrown_identity() {
        let thrown = Thrown::msg("boom");
        let err = unwrap_fault(HostFault::Target(thrown.clone()));
        assert!(err.thrown().unwrap().same_as(&thrown));
    }

    #[test]
    fn test_unwrap_fault_passes_illegal_through() {
        let err = unwrap_fault(HostFault::Illegal(InvocationError::MissingReceiver("m".into())));
        assert!(matches!(err, InvocationError::MissingReceiver(_)));
        let err = unwrap_fault(HostFault::Access(ResolutionError::UnknownType("T".into())));
        assert!(matches!(err, InvocationError::Backend(_)));
    }

    #[test]
    fn test_reflective_invoke() {
        let classes = Arc::new(ClassRegistry::with_builtins());
        let desc = MemberDescriptor::static_method("Integer", "parseInt", vec![Type::Str], Type::Int);
        let invoker = ReflectiveInvoker::new(desc, classes.snapshot());
        assert_eq!(invoker.invoke(None, &[Value::from("42")]).unwrap(), Value::Int(42));
        assert!(invoker.invoke(None, &[]).unwrap_err().is_arity_mismatch());
        assert!(invoker.invoke(None, &[Value::from("x")]).unwrap_err().thrown().is_some());
    }

    #[test]
    fn test_reflective_resolves_classes_registered_later() {
        let classes = Arc::new(ClassRegistry::with_builtins());
        let desc = MemberDescriptor::static_method("Late", "answer", vec![], Type::Int);
        let invoker = ReflectiveInvoker::new(desc, classes.snapshot());
        assert!(matches!(invoker.invoke(None, &[]), Err(InvocationError::Backend(_))));

        classes
            .register(ClassBuilder::new("Late").static_method("answer", vec![], Type::Int, |_| Ok(Value::Int(42))))
            .unwrap();
        assert_eq!(invoker.invoke(None, &[]).unwrap(), Value::Int(42));
    }
}
