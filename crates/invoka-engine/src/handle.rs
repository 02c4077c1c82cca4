//! Resolved handles
//!
//! A `ResolvedHandle` is a member descriptor checked once against a snapshot
//! of the class registry, with its target and per-parameter converters
//! pinned down. Calls read that snapshot without taking the registry lock.
//! It is the cheapest way to call a member repeatedly: no lookup, no access
//! check and no type dispatch is repeated per call.
//!
//! Handles have two kinds of entry points:
//!
//! - fixed-arity entries (`invoke_fixed_static` / `invoke_fixed_instance`)
//!   taking exactly `N` argument references, used by the dispatch table
//! - `invoke_with_arguments`, a variadic entry taking a slice

use std::sync::Arc;

use invoka_sdk::{InvocationError, MemberDescriptor, ResolutionError, Slot, Value};

use crate::callable::Invoker;
use crate::coerce::Converter;
use crate::host::registry::{check_arity, resolve, ClassView, ResolvedMember, NO_RECEIVER};
use crate::host::ClassRegistry;
use crate::select::Backend;

/// Pre-resolved reference to one member
pub(crate) struct ResolvedHandle {
    descriptor: MemberDescriptor,
    classes: ClassView,
    resolved: ResolvedMember,
    converters: Box<[Converter]>,
}

impl ResolvedHandle {
    /// Resolve `descriptor` against `classes`.
    ///
    /// Acquiring twice for the same descriptor yields equivalent handles.
    pub(crate) fn acquire(
        classes: &Arc<ClassRegistry>,
        descriptor: &MemberDescriptor,
    ) -> Result<Self, ResolutionError> {
        let view = classes.snapshot();
        let resolved = resolve(&view, descriptor)?;
        let converters = descriptor
            .parameter_types()
            .iter()
            .map(Converter::for_type)
            .collect();
        tracing::trace!(member = %descriptor, "acquired handle");
        Ok(Self {
            descriptor: descriptor.clone(),
            classes: view,
            resolved,
            converters,
        })
    }

    pub(crate) fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }

    pub(crate) fn classes(&self) -> &ClassView {
        &self.classes
    }

    pub(crate) fn resolved(&self) -> &ResolvedMember {
        &self.resolved
    }

    pub(crate) fn converters(&self) -> &[Converter] {
        &self.converters
    }

    /// Fixed-arity entry for static members and constructors
    #[inline]
    pub(crate) fn invoke_fixed_static<const N: usize>(&self, args: [&Value; N]) -> Result<Value, InvocationError> {
        let converted = self.convert_fixed(args)?;
        self.resolved.dispatch(&self.classes, &NO_RECEIVER, &converted)
    }

    /// Fixed-arity entry for instance members
    #[inline]
    pub(crate) fn invoke_fixed_instance<const N: usize>(
        &self,
        receiver: &Value,
        args: [&Value; N],
    ) -> Result<Value, InvocationError> {
        let receiver = self
            .resolved
            .check_receiver(&self.classes, Some(receiver), &self.descriptor)?;
        let converted = self.convert_fixed(args)?;
        self.resolved.dispatch(&self.classes, receiver, &converted)
    }

    /// Variadic entry: checks arity and receiver, then converts into a vector
    pub(crate) fn invoke_with_arguments(
        &self,
        receiver: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        check_arity(self.converters.len(), args.len())?;
        let receiver = self
            .resolved
            .check_receiver(&self.classes, receiver, &self.descriptor)?;
        let converted = self
            .converters
            .iter()
            .zip(args)
            .enumerate()
            .map(|(i, (converter, arg))| self.convert(i, converter, arg))
            .collect::<Result<Vec<_>, _>>()?;
        self.resolved.dispatch(&self.classes, receiver, &converted)
    }

    #[inline]
    fn convert_fixed<const N: usize>(&self, args: [&Value; N]) -> Result<[Value; N], InvocationError> {
        check_arity(self.converters.len(), N)?;
        let mut converted: [Value; N] = std::array::from_fn(|_| Value::Null);
        for (i, ((slot, converter), arg)) in converted
            .iter_mut()
            .zip(self.converters.iter())
            .zip(args)
            .enumerate()
        {
            *slot = self.convert(i, converter, arg)?;
        }
        Ok(converted)
    }

    #[inline]
    fn convert(&self, index: usize, converter: &Converter, arg: &Value) -> Result<Value, InvocationError> {
        converter
            .apply(arg, &self.classes)
            .map_err(|err| InvocationError::coercion(Slot::Argument(index), err))
    }
}

impl std::fmt::Debug for ResolvedHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedHandle")
            .field("descriptor", &self.descriptor.to_string())
            .finish()
    }
}

/// Callable backend calling the handle's variadic entry.
///
/// Used when a fixed-arity backend is requested for a member the table does
/// not cover.
#[derive(Debug)]
pub(crate) struct VariadicInvoker {
    handle: ResolvedHandle,
}

impl VariadicInvoker {
    pub(crate) fn new(handle: ResolvedHandle) -> Self {
        Self { handle }
    }
}

impl Invoker for VariadicInvoker {
    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvocationError> {
        self.handle.invoke_with_arguments(receiver, args)
    }

    fn backend(&self) -> Backend {
        Backend::HandleVariadic
    }
}
