//! Generated adapters
//!
//! An adapter is a single-purpose implementation of the call contract for
//! one member. Its blueprint is taken from a resolved handle when the
//! Callable is built: the resolved member with its receiver check and
//! dispatch form, one converter per parameter position, and the handle's
//! registry snapshot are all fixed up front, so a call runs straight through
//! them with no generic lookups.
//!
//! The adapter itself is emitted on first use. Each one gets a process-wide
//! unique name from an atomic counter and is loaded into its own
//! [`AdapterUnit`]. When several threads race on first use, every thread may
//! emit an adapter; the first one installed wins and the others are dropped.

mod unit;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use invoka_sdk::{InvocationError, MemberDescriptor, Slot, Value};
use once_cell::sync::OnceCell;

use crate::callable::Invoker;
use crate::coerce::Converter;
use crate::handle::ResolvedHandle;
use crate::host::registry::{check_arity, ClassView, ResolvedMember};
use crate::select::Backend;

use unit::AdapterUnit;

/// Counter for adapter names
static NEXT_ADAPTER_ID: AtomicU64 = AtomicU64::new(0);

/// Allocate a unique adapter id and its name
fn next_adapter_name(prefix: &str) -> (u64, Arc<str>) {
    let id = NEXT_ADAPTER_ID.fetch_add(1, Ordering::Relaxed);
    (id, Arc::from(format!("{}${}", prefix, id)))
}

// ============================================================================
// Blueprint
// ============================================================================

/// Everything an adapter for one member needs, fixed at Callable construction
#[derive(Debug, Clone)]
pub(crate) struct AdapterBlueprint {
    descriptor: MemberDescriptor,
    classes: ClassView,
    resolved: ResolvedMember,
    loads: Arc<[Converter]>,
}

impl AdapterBlueprint {
    /// Derive the blueprint from a resolved handle
    pub(crate) fn plan(handle: &ResolvedHandle) -> Self {
        Self {
            descriptor: handle.descriptor().clone(),
            classes: handle.classes().clone(),
            resolved: handle.resolved().clone(),
            loads: handle.converters().into(),
        }
    }

    /// Emit an adapter named `name`
    fn emit(&self, name: Arc<str>) -> GeneratedAdapter {
        GeneratedAdapter {
            name,
            blueprint: self.clone(),
        }
    }
}

// ============================================================================
// GeneratedAdapter
// ============================================================================

/// An emitted adapter
#[derive(Debug)]
pub(crate) struct GeneratedAdapter {
    name: Arc<str>,
    blueprint: AdapterBlueprint,
}

impl GeneratedAdapter {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Run the call body: arity, receiver cast, loads, dispatch
    pub(crate) fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvocationError> {
        let plan = &self.blueprint;
        check_arity(plan.loads.len(), args.len())?;
        let this = plan
            .resolved
            .check_receiver(&plan.classes, receiver, &plan.descriptor)?;

        let mut loaded = Vec::with_capacity(args.len());
        for (i, (load, arg)) in plan.loads.iter().zip(args).enumerate() {
            let value = load
                .apply(arg, &plan.classes)
                .map_err(|err| InvocationError::coercion(Slot::Argument(i), err))?;
            loaded.push(value);
        }

        plan.resolved.dispatch(&plan.classes, this, &loaded)
    }
}

// ============================================================================
// GeneratedInvoker
// ============================================================================

/// Callable backend that emits its adapter on first use
#[derive(Debug)]
pub(crate) struct GeneratedInvoker {
    blueprint: AdapterBlueprint,
    prefix: Arc<str>,
    unit: OnceCell<AdapterUnit>,
}

impl GeneratedInvoker {
    pub(crate) fn new(blueprint: AdapterBlueprint, prefix: impl Into<Arc<str>>) -> Self {
        Self {
            blueprint,
            prefix: prefix.into(),
            unit: OnceCell::new(),
        }
    }

    /// Emit, load and seal a fresh adapter, then try to install it.
    ///
    /// Concurrent callers may each emit one; whichever is installed first is
    /// used by everyone and the rest are dropped.
    #[cold]
    fn materialize(&self) -> Result<&AdapterUnit, InvocationError> {
        let (id, name) = next_adapter_name(&self.prefix);
        let mut unit = AdapterUnit::new(id, name.clone());
        unit.define(self.blueprint.emit(name.clone()))
            .map_err(|err| InvocationError::Backend(err.to_string()))?;
        unit.seal()
            .map_err(|err| InvocationError::Backend(err.to_string()))?;

        tracing::debug!(
            adapter = %name,
            unit = unit.id(),
            state = ?unit.state(),
            member = %self.blueprint.descriptor,
            arity = self.blueprint.descriptor.arity(),
            "generated adapter"
        );

        if let Err(loser) = self.unit.set(unit) {
            tracing::trace!(adapter = %loser.name(), "discarding adapter that lost the first-use race");
        }
        self.unit
            .get()
            .ok_or_else(|| InvocationError::Backend(format!("adapter {} was not installed", name)))
    }
}

impl Invoker for GeneratedInvoker {
    #[inline]
    fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvocationError> {
        let unit = match self.unit.get() {
            Some(unit) => unit,
            None => self.materialize()?,
        };
        unit.invoke(receiver, args)
    }

    fn backend(&self) -> Backend {
        Backend::Generated
    }

    fn adapter_name(&self) -> Option<Arc<str>> {
        self.unit.get().map(|unit| unit.name().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoka_sdk::{CoercionError, Thrown, Type};

    use super::unit::UnitState;
    use crate::host::{ClassBuilder, ClassRegistry};

    fn handle(desc: &MemberDescriptor) -> ResolvedHandle {
        let registry = ClassRegistry::with_builtins();
        registry
            .register(
                ClassBuilder::new("Acc")
                    .constructor(vec![Type::Int], |args| Ok(args.to_vec()))
                    .method("fail", vec![], Type::Void, |_, _| Err(Thrown::msg("failed"))),
            )
            .unwrap();
        ResolvedHandle::acquire(&Arc::new(registry), desc).unwrap()
    }

    #[test]
    fn test_adapter_names_are_unique() {
        let (a, name_a) = next_adapter_name("test$Adapter");
        let (b, name_b) = next_adapter_name("test$Adapter");
        assert!(b > a);
        assert_ne!(name_a, name_b);
        assert!(name_a.starts_with("test$Adapter$"));
    }

    #[test]
    fn test_unit_lifecycle() {
        let desc = MemberDescriptor::method("String", "length", vec![], Type::Int);
        let blueprint = AdapterBlueprint::plan(&handle(&desc));
        let mut unit = AdapterUnit::new(7, Arc::from("unit$7"));
        assert_eq!(unit.id(), 7);
        assert_eq!(unit.state(), UnitState::Building);

        // not runnable before sealing
        assert!(matches!(
            unit.invoke(Some(&Value::from("abc")), &[]),
            Err(InvocationError::Backend(_))
        ));
        assert!(unit.define(blueprint.emit(Arc::from("other"))).is_err());
        unit.define(blueprint.emit(Arc::from("unit$7"))).unwrap();
        assert!(unit.define(blueprint.emit(Arc::from("unit$7"))).is_err());
        unit.seal().unwrap();
        assert_eq!(unit.state(), UnitState::Sealed);
        assert_eq!(unit.invoke(Some(&Value::from("abc")), &[]).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_seal_empty_unit_fails() {
        let mut unit = AdapterUnit::new(0, Arc::from("empty"));
        assert!(unit.seal().is_err());
    }

    #[test]
    fn test_invoker_materializes_once() {
        let desc = MemberDescriptor::constructor("Acc", vec![Type::Int]);
        let invoker = GeneratedInvoker::new(AdapterBlueprint::plan(&handle(&desc)), "test$Adapter");
        assert!(invoker.adapter_name().is_none());
        let value = invoker.invoke(None, &[Value::Byte(9)]).unwrap();
        assert_eq!(value, Value::object("Acc", vec![Value::Int(9)]));
        let name = invoker.adapter_name().unwrap();
        invoker.invoke(None, &[Value::Int(1)]).unwrap();
        assert_eq!(invoker.adapter_name().unwrap(), name);
    }

    #[test]
    fn test_void_member_failure_is_target() {
        let desc = MemberDescriptor::method("Acc", "fail", vec![], Type::Void);
        let invoker = GeneratedInvoker::new(AdapterBlueprint::plan(&handle(&desc)), "test$Adapter");
        let acc = Value::object("Acc", vec![Value::Int(0)]);
        let err = invoker.invoke(Some(&acc), &[]).unwrap_err();
        assert_eq!(err.thrown().unwrap().to_string(), "failed");
    }

    #[test]
    fn test_adapter_receiver_checks_match_handle() {
        let length = MemberDescriptor::method("String", "length", vec![], Type::Int);
        let resolved = handle(&length);
        let adapter = AdapterBlueprint::plan(&resolved).emit(Arc::from("test$Adapter$receiver"));
        let acc = Value::object("Acc", vec![Value::Int(0)]);
        for receiver in [None, Some(Value::Null), Some(acc)] {
            let from_adapter = adapter.invoke(receiver.as_ref(), &[]).unwrap_err();
            let from_handle = resolved.invoke_with_arguments(receiver.as_ref(), &[]).unwrap_err();
            assert_eq!(from_adapter.to_string(), from_handle.to_string());
        }
        let err = adapter.invoke(Some(&Value::Int(1)), &[]).unwrap_err();
        assert!(matches!(
            err,
            InvocationError::Coercion {
                slot: Slot::Receiver,
                source: CoercionError::NotAssignable { .. }
            }
        ));

        let ctor = MemberDescriptor::constructor("Acc", vec![Type::Int]);
        let adapter = AdapterBlueprint::plan(&handle(&ctor)).emit(Arc::from("test$Adapter$ctor"));
        assert!(matches!(
            adapter.invoke(Some(&Value::from("x")), &[Value::Int(1)]),
            Err(InvocationError::UnexpectedReceiver(_))
        ));
        assert!(adapter.invoke(Some(&Value::Null), &[Value::Int(1)]).is_ok());
    }
}
