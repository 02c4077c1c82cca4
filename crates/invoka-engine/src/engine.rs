//! Engine entry points
//!
//! `InvokeEngine` turns member descriptors into [`Callable`]s: it acquires a
//! resolved handle, selects a backend and wires the two together.

use std::sync::Arc;

use invoka_sdk::{MemberDescriptor, ResolutionError};

use crate::adapter::{AdapterBlueprint, GeneratedInvoker};
use crate::callable::Callable;
use crate::config::EngineConfig;
use crate::handle::{ResolvedHandle, VariadicInvoker};
use crate::host::ClassRegistry;
use crate::reflective::ReflectiveInvoker;
use crate::select::{select_backend, Backend, Preference};
use crate::table::{entry_for, FixedInvoker};

/// Builds Callables against one class registry
#[derive(Debug, Clone)]
pub struct InvokeEngine {
    classes: Arc<ClassRegistry>,
    config: EngineConfig,
}

impl InvokeEngine {
    /// Create an engine with the default configuration
    pub fn new(classes: Arc<ClassRegistry>) -> Self {
        Self::with_config(classes, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration
    pub fn with_config(classes: Arc<ClassRegistry>, config: EngineConfig) -> Self {
        Self { classes, config }
    }

    /// The class registry members are resolved against
    pub fn classes(&self) -> &Arc<ClassRegistry> {
        &self.classes
    }

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build a Callable for a static or instance method
    pub fn for_method(
        &self,
        descriptor: &MemberDescriptor,
        preference: Preference,
    ) -> Result<Callable, ResolutionError> {
        if descriptor.is_constructor() {
            return Err(ResolutionError::Inconsistent(format!(
                "{} is a constructor; use for_constructor",
                descriptor
            )));
        }
        self.build(descriptor, preference)
    }

    /// Build a Callable for a constructor
    pub fn for_constructor(
        &self,
        descriptor: &MemberDescriptor,
        preference: Preference,
    ) -> Result<Callable, ResolutionError> {
        if !descriptor.is_constructor() {
            return Err(ResolutionError::Inconsistent(format!(
                "{} is not a constructor; use for_method",
                descriptor
            )));
        }
        self.build(descriptor, preference)
    }

    fn build(&self, descriptor: &MemberDescriptor, preference: Preference) -> Result<Callable, ResolutionError> {
        // Resolve before selecting: access and shape errors take precedence.
        let handle = ResolvedHandle::acquire(&self.classes, descriptor)?;
        let backend = select_backend(descriptor, preference, &self.config).map_err(|err| {
            tracing::warn!(member = %descriptor, error = %err, "adapter synthesis refused");
            err
        })?;
        tracing::debug!(member = %descriptor, ?preference, %backend, "selected backend");
        Ok(self.wire(handle, backend))
    }

    /// Bind a resolved handle to the selected backend
    fn wire(&self, handle: ResolvedHandle, backend: Backend) -> Callable {
        match backend {
            Backend::FixedArity { .. } => match entry_for(handle.descriptor(), self.config.fixed_arity_limit) {
                Some(entry) => Callable::from_invoker(FixedInvoker::new(handle, entry)),
                None => Callable::from_invoker(VariadicInvoker::new(handle)),
            },
            Backend::HandleVariadic => Callable::from_invoker(VariadicInvoker::new(handle)),
            Backend::Generated => Callable::from_invoker(GeneratedInvoker::new(
                AdapterBlueprint::plan(&handle),
                self.config.adapter_prefix.as_str(),
            )),
            Backend::Reflective => Callable::from_invoker(ReflectiveInvoker::new(
                handle.descriptor().clone(),
                handle.classes().clone(),
            )),
            Backend::Empty => Callable::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoka_sdk::{GenerationError, Type, Value};

    fn engine() -> InvokeEngine {
        InvokeEngine::new(Arc::new(ClassRegistry::with_builtins()))
    }

    #[test]
    fn test_entry_points_check_kind() {
        let engine = engine();
        let ctor = MemberDescriptor::constructor("Object", vec![]);
        assert!(matches!(
            engine.for_method(&ctor, Preference::Recommended),
            Err(ResolutionError::Inconsistent(_))
        ));
        let length = MemberDescriptor::method("String", "length", vec![], Type::Int);
        assert!(matches!(
            engine.for_constructor(&length, Preference::Recommended),
            Err(ResolutionError::Inconsistent(_))
        ));
        assert!(engine.for_constructor(&ctor, Preference::Recommended).is_ok());
    }

    #[test]
    fn test_backend_wiring() {
        let engine = engine();
        let length = MemberDescriptor::method("String", "length", vec![], Type::Int);
        let fixed = engine.for_method(&length, Preference::Recommended).unwrap();
        assert_eq!(fixed.backend(), Backend::FixedArity { arity: 0, instance: true });
        let generated = engine.for_method(&length, Preference::Generated).unwrap();
        assert_eq!(generated.backend(), Backend::Generated);
        let reflective = engine.for_method(&length, Preference::Reflective).unwrap();
        assert_eq!(reflective.backend(), Backend::Reflective);

        let hello = Value::from("hello");
        for callable in [&fixed, &generated, &reflective] {
            assert_eq!(callable.invoke(Some(&hello), &[]).unwrap(), Value::Int(5));
        }
    }

    #[test]
    fn test_empty_backend_wires_to_shared_empty() {
        let engine = engine();
        let length = MemberDescriptor::method("String", "length", vec![], Type::Int);
        let handle = ResolvedHandle::acquire(engine.classes(), &length).unwrap();
        let callable = engine.wire(handle, Backend::Empty);
        assert!(callable.ptr_eq(&Callable::empty()));
        assert_eq!(callable.backend(), Backend::Empty);
        assert_eq!(callable.invoke(None, &[]).unwrap(), Value::Null);
    }

    #[test]
    fn test_resolution_precedes_selection() {
        let engine = InvokeEngine::with_config(
            Arc::new(ClassRegistry::with_builtins()),
            EngineConfig {
                allow_synthesis: false,
                ..EngineConfig::default()
            },
        );
        let missing = MemberDescriptor::method("String", "reverse", vec![], Type::Str);
        assert!(matches!(
            engine.for_method(&missing, Preference::Generated),
            Err(ResolutionError::NoSuchMember(_))
        ));
        let length = MemberDescriptor::method("String", "length", vec![], Type::Int);
        assert!(matches!(
            engine.for_method(&length, Preference::Generated),
            Err(ResolutionError::Generation(GenerationError::Forbidden { .. }))
        ));
    }
}
