//! Class registry
//!
//! The introspection facility the engine resolves member descriptors
//! against. Classes are registered once and never change afterwards, so a
//! resolved member stays valid for the lifetime of the registry.
//!
//! The class table is copy-on-write: registration publishes a new table and
//! callables keep the [`ClassView`] they were built with, so call-time class
//! lookups never touch the registry lock.

use std::sync::Arc;

use invoka_sdk::{
    ArityMismatch, CoercionError, DispatchKind, InvocationError, MemberDescriptor, ResolutionError,
    Slot, Thrown, Type, Value,
};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use super::class::{ClassBuilder, ClassDef, ConstructorDef, MethodDef, MethodKey, Visibility};
use crate::coerce;

/// Name of the root class every class implicitly extends
pub const OBJECT: &str = "Object";

/// Placeholder receiver handed to static members and constructors
pub(crate) static NO_RECEIVER: Value = Value::Null;

type ClassTable = FxHashMap<Arc<str>, Arc<ClassDef>>;

/// Class lookups needed to check and dispatch a call
pub trait ClassLookup {
    /// Look up a class by name
    fn class(&self, name: &str) -> Option<Arc<ClassDef>>;

    /// Check if `class` is `ancestor` or inherits from it
    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool {
        if class == ancestor || ancestor == OBJECT {
            return true;
        }
        self.class(class)
            .map(|def| def.is_subtype_of(ancestor))
            .unwrap_or(false)
    }

    /// Check if `value` is an instance of `class`. `null` is an instance of nothing.
    fn is_instance(&self, value: &Value, class: &str) -> bool {
        match value {
            Value::Null => false,
            other => self.is_subclass_of(other.type_name(), class),
        }
    }
}

/// Snapshot of the class table taken when a Callable is built.
///
/// Lookups read the snapshot without locking. Classes registered after the
/// snapshot are still found through the live registry.
#[derive(Debug, Clone)]
pub(crate) struct ClassView {
    table: Arc<ClassTable>,
    live: Arc<ClassRegistry>,
}

impl ClassLookup for ClassView {
    fn class(&self, name: &str) -> Option<Arc<ClassDef>> {
        match self.table.get(name) {
            Some(def) => Some(def.clone()),
            None => self.live.get(name),
        }
    }
}

/// Registration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A class with this name already exists
    #[error("Class already registered: {0}")]
    Duplicate(String),

    /// A superclass or interface has not been registered yet
    #[error("Class {class} refers to unknown supertype {supertype}")]
    UnknownSupertype {
        /// Class being registered
        class: String,
        /// Missing supertype
        supertype: String,
    },

    /// A class extends an interface, implements a class, or similar
    #[error("Class {class} cannot inherit from {supertype}: {reason}")]
    InvalidSupertype {
        /// Class being registered
        class: String,
        /// Offending supertype
        supertype: String,
        /// What is wrong with it
        reason: &'static str,
    },
}

/// Failure of the generic reflective entry point.
///
/// A member's own error arrives behind the `Target` indirection; callers
/// that want a single error shape must unwrap it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostFault {
    /// The member raised an error
    #[error("Invocation target raised: {0}")]
    Target(Thrown),

    /// The call itself was illegal (arity, receiver or argument types)
    #[error(transparent)]
    Illegal(InvocationError),

    /// The member could not be found or is not accessible
    #[error(transparent)]
    Access(ResolutionError),
}

// ============================================================================
// Resolved members
// ============================================================================

/// How a resolved member is reached at call time
#[derive(Debug, Clone)]
pub(crate) enum Member {
    /// Static method, bound directly
    Static(Arc<MethodDef>),
    /// Instance method of a class, overridable by the receiver's class
    Virtual {
        key: MethodKey,
        declared: Arc<MethodDef>,
    },
    /// Interface method, always looked up in the receiver's class
    Interface {
        key: MethodKey,
        declared: Arc<MethodDef>,
    },
    /// Allocation plus initializer
    Construct(Arc<ConstructorDef>),
}

/// A member descriptor checked against its live declaring class
#[derive(Debug, Clone)]
pub(crate) struct ResolvedMember {
    pub(crate) class: Arc<ClassDef>,
    pub(crate) member: Member,
}

impl ResolvedMember {
    /// Check the receiver against the dispatch kind and declaring class.
    ///
    /// Returns the value to hand to the member body: the receiver for
    /// instance members, `Null` for static members and constructors.
    pub(crate) fn check_receiver<'a>(
        &self,
        classes: &dyn ClassLookup,
        receiver: Option<&'a Value>,
        descriptor: &MemberDescriptor,
    ) -> Result<&'a Value, InvocationError> {
        if !descriptor.dispatch_kind().takes_receiver() {
            return match receiver {
                Some(value) if !value.is_null() => {
                    Err(InvocationError::UnexpectedReceiver(descriptor.to_string()))
                }
                _ => Ok(&NO_RECEIVER),
            };
        }
        match receiver {
            None | Some(Value::Null) => Err(InvocationError::MissingReceiver(descriptor.to_string())),
            Some(value) if classes.is_instance(value, self.class.name()) => Ok(value),
            Some(value) => Err(InvocationError::coercion(
                Slot::Receiver,
                CoercionError::NotAssignable {
                    class: value.type_name().to_string(),
                    target: Type::class(self.class.name()),
                },
            )),
        }
    }

    /// Run the member with a checked receiver and converted arguments
    pub(crate) fn dispatch(
        &self,
        classes: &dyn ClassLookup,
        receiver: &Value,
        args: &[Value],
    ) -> Result<Value, InvocationError> {
        match &self.member {
            Member::Static(method) => call(method, receiver, args),
            Member::Virtual { key, declared } | Member::Interface { key, declared } => {
                let target = select_override(classes, &self.class, key, declared, receiver)?;
                call(&target, receiver, args)
            }
            Member::Construct(ctor) => construct(&self.class, ctor, args),
        }
    }
}

/// Run a method body and normalize its result
pub(crate) fn call(method: &MethodDef, receiver: &Value, args: &[Value]) -> Result<Value, InvocationError> {
    let body = method.body.as_ref().ok_or_else(|| InvocationError::Unimplemented {
        member: method.name.to_string(),
        class: receiver.type_name().to_string(),
    })?;
    match body(receiver, args) {
        Ok(_) if method.ret == Type::Void => Ok(Value::Null),
        Ok(value) => Ok(value),
        Err(thrown) => Err(InvocationError::Target(thrown)),
    }
}

/// Allocate a new instance of `class` through `ctor`
pub(crate) fn construct(class: &ClassDef, ctor: &ConstructorDef, args: &[Value]) -> Result<Value, InvocationError> {
    let fields = (ctor.init)(args).map_err(InvocationError::Target)?;
    Ok(Value::object(class.name_arc().clone(), fields))
}

/// Fail with `ArityMismatch` unless exactly `expected` arguments were supplied
#[inline]
pub(crate) fn check_arity(expected: usize, found: usize) -> Result<(), InvocationError> {
    if expected == found {
        Ok(())
    } else {
        Err(ArityMismatch { expected, found }.into())
    }
}

fn check_access(descriptor: &MemberDescriptor, visibility: Visibility) -> Result<(), ResolutionError> {
    match visibility {
        Visibility::Public => Ok(()),
        other => Err(ResolutionError::Inaccessible {
            member: descriptor.to_string(),
            visibility: other.to_string(),
        }),
    }
}

// ============================================================================
// ClassRegistry
// ============================================================================

/// Thread-safe registry of classes and interfaces
pub struct ClassRegistry {
    classes: RwLock<Arc<ClassTable>>,
}

impl ClassRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            classes: RwLock::new(Arc::new(FxHashMap::default())),
        }
    }

    /// Create a registry holding `Object`, `String` and the boxed primitive classes
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        super::builtins::install(&registry);
        registry
    }

    /// Register a class.
    ///
    /// Supertypes must already be registered. Classes without an explicit
    /// superclass extend `Object` once it exists.
    pub fn register(&self, builder: ClassBuilder) -> Result<Arc<ClassDef>, RegistryError> {
        let mut classes = self.classes.write();
        let name = builder.name.clone();
        if classes.contains_key(&name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        let superclass = match builder.superclass {
            Some(superclass) => Some(superclass),
            None if !builder.is_interface && &*name != OBJECT && classes.contains_key(OBJECT) => {
                Some(Arc::from(OBJECT))
            }
            None => None,
        };

        let mut vtable: FxHashMap<MethodKey, Arc<MethodDef>> = FxHashMap::default();
        let mut ancestors: FxHashSet<Arc<str>> = FxHashSet::default();
        ancestors.insert(name.clone());

        // Interface defaults first so inherited and own entries take precedence.
        for interface in &builder.interfaces {
            let def = lookup_supertype(&classes, &name, interface)?;
            if !def.is_interface {
                return Err(invalid(&name, interface, "not an interface"));
            }
            inherit(&mut vtable, &mut ancestors, def);
        }

        if let Some(superclass) = &superclass {
            if builder.is_interface {
                return Err(invalid(&name, superclass, "interfaces only extend interfaces"));
            }
            let def = lookup_supertype(&classes, &name, superclass)?;
            if def.is_interface {
                return Err(invalid(&name, superclass, "cannot extend an interface"));
            }
            inherit(&mut vtable, &mut ancestors, def);
        }

        let methods: Vec<Arc<MethodDef>> = builder.methods.into_iter().map(Arc::new).collect();
        for method in methods.iter().filter(|m| !m.is_static) {
            vtable.insert(method.key(), method.clone());
        }

        let def = Arc::new(ClassDef {
            name: name.clone(),
            superclass,
            interfaces: builder.interfaces,
            is_interface: builder.is_interface,
            is_abstract: builder.is_abstract,
            methods,
            constructors: builder.constructors.into_iter().map(Arc::new).collect(),
            vtable,
            ancestors,
        });
        // Views taken earlier keep the old table; later ones see this class.
        Arc::make_mut(&mut classes).insert(name, def.clone());
        tracing::trace!(class = %def.name(), "registered class");
        Ok(def)
    }

    /// Look up a class by name
    pub fn get(&self, name: &str) -> Option<Arc<ClassDef>> {
        self.classes.read().get(name).cloned()
    }

    /// Check if a class is registered
    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    /// Number of registered classes
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    /// Take a lock-free view of the classes registered so far
    pub(crate) fn snapshot(self: &Arc<Self>) -> ClassView {
        ClassView {
            table: self.classes.read().clone(),
            live: Arc::clone(self),
        }
    }

    /// Generic reflective entry point.
    ///
    /// Re-finds the member, re-checks access and converts each argument on
    /// every call. A member's own failure is reported as [`HostFault::Target`].
    pub fn invoke_member(
        &self,
        descriptor: &MemberDescriptor,
        receiver: Option<&Value>,
        args: &[Value],
    ) -> Result<Value, HostFault> {
        invoke_reflective(self, descriptor, receiver, args)
    }
}

impl ClassLookup for ClassRegistry {
    fn class(&self, name: &str) -> Option<Arc<ClassDef>> {
        self.get(name)
    }
}

/// Check a descriptor against the live class and pin down its target
pub(crate) fn resolve(
    classes: &dyn ClassLookup,
    descriptor: &MemberDescriptor,
) -> Result<ResolvedMember, ResolutionError> {
    let class = classes
        .class(descriptor.declaring_type())
        .ok_or_else(|| ResolutionError::UnknownType(descriptor.declaring_type().to_string()))?;
    let params = descriptor.parameter_types();

    let member = match descriptor.dispatch_kind() {
        DispatchKind::Constructor => {
            if class.is_interface() {
                return Err(ResolutionError::Unsupported(format!(
                    "{} is an interface and has no constructors",
                    class.name()
                )));
            }
            if class.is_abstract() {
                return Err(ResolutionError::Unsupported(format!(
                    "cannot instantiate abstract class {}",
                    class.name()
                )));
            }
            let ctor = class
                .constructor(params)
                .ok_or_else(|| ResolutionError::NoSuchMember(descriptor.to_string()))?;
            check_access(descriptor, ctor.visibility)?;
            Member::Construct(ctor.clone())
        }
        DispatchKind::Static => {
            let method = class
                .declared_method(descriptor.name(), params)
                .ok_or_else(|| ResolutionError::NoSuchMember(descriptor.to_string()))?;
            if !method.is_static {
                return Err(ResolutionError::Inconsistent(format!(
                    "{} is an instance method",
                    descriptor
                )));
            }
            check_signature(descriptor, method)?;
            Member::Static(method.clone())
        }
        kind @ (DispatchKind::Virtual | DispatchKind::Interface) => {
            let interface_kind = kind == DispatchKind::Interface;
            if interface_kind != class.is_interface() {
                return Err(ResolutionError::Inconsistent(format!(
                    "{} is {} but {} dispatch was requested",
                    class.name(),
                    if class.is_interface() { "an interface" } else { "a class" },
                    if interface_kind { "interface" } else { "virtual" },
                )));
            }
            let key = MethodKey::new(descriptor.name(), params);
            let declared = match class.resolve_virtual(&key) {
                Some(method) => method.clone(),
                None => {
                    return Err(match class.declared_method(descriptor.name(), params) {
                        Some(_) => ResolutionError::Inconsistent(format!("{} is static", descriptor)),
                        None => ResolutionError::NoSuchMember(descriptor.to_string()),
                    })
                }
            };
            check_signature(descriptor, &declared)?;
            if interface_kind {
                Member::Interface { key, declared }
            } else {
                Member::Virtual { key, declared }
            }
        }
    };

    Ok(ResolvedMember { class, member })
}

/// Pick the implementation the receiver's runtime class provides for `key`
pub(crate) fn select_override(
    classes: &dyn ClassLookup,
    declaring: &ClassDef,
    key: &MethodKey,
    declared: &Arc<MethodDef>,
    receiver: &Value,
) -> Result<Arc<MethodDef>, InvocationError> {
    let runtime = receiver.type_name();
    if runtime == declaring.name() && !declared.is_abstract() {
        return Ok(declared.clone());
    }
    let found = match classes.class(runtime) {
        Some(class) => class.resolve_virtual(key).cloned(),
        None => Some(declared.clone()),
    };
    match found {
        Some(method) if !method.is_abstract() => Ok(method),
        _ => Err(InvocationError::Unimplemented {
            member: format!("{}.{}", declaring.name(), key.name()),
            class: runtime.to_string(),
        }),
    }
}

/// Reflective call: resolve, check and convert everything on each call
pub(crate) fn invoke_reflective(
    classes: &dyn ClassLookup,
    descriptor: &MemberDescriptor,
    receiver: Option<&Value>,
    args: &[Value],
) -> Result<Value, HostFault> {
    let resolved = resolve(classes, descriptor).map_err(HostFault::Access)?;
    check_arity(descriptor.arity(), args.len()).map_err(HostFault::Illegal)?;
    let receiver = resolved
        .check_receiver(classes, receiver, descriptor)
        .map_err(HostFault::Illegal)?;

    let mut converted = Vec::with_capacity(args.len());
    for (i, (ty, arg)) in descriptor.parameter_types().iter().zip(args).enumerate() {
        let value = coerce::convert(ty, arg, classes)
            .map_err(|err| HostFault::Illegal(InvocationError::coercion(Slot::Argument(i), err)))?;
        converted.push(value);
    }

    resolved
        .dispatch(classes, receiver, &converted)
        .map_err(|err| match err {
            InvocationError::Target(thrown) => HostFault::Target(thrown),
            other => HostFault::Illegal(other),
        })
}

impl Default for ClassRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.len())
            .finish()
    }
}

fn check_signature(descriptor: &MemberDescriptor, method: &MethodDef) -> Result<(), ResolutionError> {
    if &method.ret != descriptor.return_type() {
        return Err(ResolutionError::Inconsistent(format!(
            "{} actually returns {}",
            descriptor, method.ret
        )));
    }
    check_access(descriptor, method.visibility)
}

fn lookup_supertype<'a>(
    classes: &'a ClassTable,
    class: &str,
    supertype: &str,
) -> Result<&'a Arc<ClassDef>, RegistryError> {
    classes.get(supertype).ok_or_else(|| RegistryError::UnknownSupertype {
        class: class.to_string(),
        supertype: supertype.to_string(),
    })
}

fn invalid(class: &str, supertype: &str, reason: &'static str) -> RegistryError {
    RegistryError::InvalidSupertype {
        class: class.to_string(),
        supertype: supertype.to_string(),
        reason,
    }
}

/// Merge a supertype's method table. An abstract entry never hides a concrete one.
fn inherit(
    vtable: &mut FxHashMap<MethodKey, Arc<MethodDef>>,
    ancestors: &mut FxHashSet<Arc<str>>,
    supertype: &ClassDef,
) {
    ancestors.extend(supertype.ancestors.iter().cloned());
    for (key, method) in &supertype.vtable {
        let keep_existing = vtable
            .get(key)
            .map(|existing| !existing.is_abstract() && method.is_abstract())
            .unwrap_or(false);
        if !keep_existing {
            vtable.insert(key.clone(), method.clone());
        }
    }
}
