//! Class definitions: members, constructors and the builder that registers them

use std::fmt;
use std::sync::Arc;

use invoka_sdk::{Thrown, Type, Value};
use rustc_hash::{FxHashMap, FxHashSet};

/// Native implementation of a method.
///
/// Receives the receiver (`Value::Null` for static members) and arguments
/// already converted to the declared parameter types.
pub type NativeBody = Arc<dyn Fn(&Value, &[Value]) -> Result<Value, Thrown> + Send + Sync>;

/// Native constructor initializer.
///
/// Receives converted arguments and returns the new instance's field values;
/// the engine performs the allocation.
pub type InitBody = Arc<dyn Fn(&[Value]) -> Result<Vec<Value>, Thrown> + Send + Sync>;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Callable from anywhere
    Public,
    /// Subclasses only
    Protected,
    /// Declaring class only
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Protected => f.write_str("protected"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

/// Method signature key: name plus parameter types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    name: Arc<str>,
    params: Arc<[Type]>,
}

impl MethodKey {
    /// Create a key
    pub fn new(name: impl Into<Arc<str>>, params: impl Into<Arc<[Type]>>) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
        }
    }

    /// Method name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter types
    pub fn params(&self) -> &[Type] {
        &self.params
    }
}

// ============================================================================
// Members
// ============================================================================

/// A method declared by a class or interface
#[derive(Clone)]
pub struct MethodDef {
    /// Method name
    pub name: Arc<str>,
    /// Parameter types
    pub params: Arc<[Type]>,
    /// Return type
    pub ret: Type,
    /// Whether the method is static
    pub is_static: bool,
    /// Declared visibility
    pub visibility: Visibility,
    /// Implementation, `None` for abstract methods
    pub body: Option<NativeBody>,
}

impl MethodDef {
    /// Public instance method
    pub fn instance(
        name: impl Into<Arc<str>>,
        params: Vec<Type>,
        ret: Type,
        body: impl Fn(&Value, &[Value]) -> Result<Value, Thrown> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            ret,
            is_static: false,
            visibility: Visibility::Public,
            body: Some(Arc::new(body)),
        }
    }

    /// Public static method
    pub fn static_fn(
        name: impl Into<Arc<str>>,
        params: Vec<Type>,
        ret: Type,
        body: impl Fn(&[Value]) -> Result<Value, Thrown> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            ret,
            is_static: true,
            visibility: Visibility::Public,
            body: Some(Arc::new(move |_receiver: &Value, args: &[Value]| body(args))),
        }
    }

    /// Public abstract instance method
    pub fn abstract_fn(name: impl Into<Arc<str>>, params: Vec<Type>, ret: Type) -> Self {
        Self {
            name: name.into(),
            params: params.into(),
            ret,
            is_static: false,
            visibility: Visibility::Public,
            body: None,
        }
    }

    /// Change the visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Signature key
    pub fn key(&self) -> MethodKey {
        MethodKey::new(self.name.clone(), self.params.clone())
    }

    /// Check if the method has no implementation
    pub fn is_abstract(&self) -> bool {
        self.body.is_none()
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("ret", &self.ret)
            .field("is_static", &self.is_static)
            .field("visibility", &self.visibility)
            .field("is_abstract", &self.is_abstract())
            .finish()
    }
}

/// A constructor declared by a class
#[derive(Clone)]
pub struct ConstructorDef {
    /// Parameter types
    pub params: Arc<[Type]>,
    /// Declared visibility
    pub visibility: Visibility,
    /// Field initializer
    pub init: InitBody,
}

impl ConstructorDef {
    /// Public constructor
    pub fn new(
        params: Vec<Type>,
        init: impl Fn(&[Value]) -> Result<Vec<Value>, Thrown> + Send + Sync + 'static,
    ) -> Self {
        Self {
            params: params.into(),
            visibility: Visibility::Public,
            init: Arc::new(init),
        }
    }

    /// Change the visibility
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("params", &self.params)
            .field("visibility", &self.visibility)
            .finish()
    }
}

// ============================================================================
// ClassDef
// ============================================================================

/// A registered class or interface.
///
/// Built by [`ClassBuilder`] and sealed on registration, at which point the
/// instance method table is flattened so that virtual and interface dispatch
/// are a single lookup.
#[derive(Debug)]
pub struct ClassDef {
    pub(crate) name: Arc<str>,
    pub(crate) superclass: Option<Arc<str>>,
    pub(crate) interfaces: Vec<Arc<str>>,
    pub(crate) is_interface: bool,
    pub(crate) is_abstract: bool,
    pub(crate) methods: Vec<Arc<MethodDef>>,
    pub(crate) constructors: Vec<Arc<ConstructorDef>>,
    /// Instance methods by signature: own, then inherited, then interface defaults
    pub(crate) vtable: FxHashMap<MethodKey, Arc<MethodDef>>,
    /// Every supertype name, including this class
    pub(crate) ancestors: FxHashSet<Arc<str>>,
}

impl ClassDef {
    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Shared class name
    pub fn name_arc(&self) -> &Arc<str> {
        &self.name
    }

    /// Direct superclass
    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    /// Directly implemented (or, for interfaces, extended) interfaces
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.interfaces.iter().map(|i| &**i)
    }

    /// Check if this is an interface
    pub fn is_interface(&self) -> bool {
        self.is_interface
    }

    /// Check if this class cannot be instantiated
    pub fn is_abstract(&self) -> bool {
        self.is_abstract || self.is_interface
    }

    /// Methods declared directly by this class
    pub fn declared_methods(&self) -> &[Arc<MethodDef>] {
        &self.methods
    }

    /// Find a method declared directly by this class
    pub fn declared_method(&self, name: &str, params: &[Type]) -> Option<&Arc<MethodDef>> {
        self.methods
            .iter()
            .find(|m| &*m.name == name && &*m.params == params)
    }

    /// Find the constructor with these parameter types
    pub fn constructor(&self, params: &[Type]) -> Option<&Arc<ConstructorDef>> {
        self.constructors.iter().find(|c| &*c.params == params)
    }

    /// Resolve an instance method through the flattened method table
    pub fn resolve_virtual(&self, key: &MethodKey) -> Option<&Arc<MethodDef>> {
        self.vtable.get(key)
    }

    /// Check if this class is `other` or inherits from it
    pub fn is_subtype_of(&self, other: &str) -> bool {
        other == "Object" || self.ancestors.contains(other)
    }
}

// ============================================================================
// ClassBuilder
// ============================================================================

/// Builder for classes and interfaces registered with a `ClassRegistry`
#[derive(Debug)]
pub struct ClassBuilder {
    pub(crate) name: Arc<str>,
    pub(crate) superclass: Option<Arc<str>>,
    pub(crate) interfaces: Vec<Arc<str>>,
    pub(crate) is_interface: bool,
    pub(crate) is_abstract: bool,
    pub(crate) methods: Vec<MethodDef>,
    pub(crate) constructors: Vec<ConstructorDef>,
}

impl ClassBuilder {
    /// Start a concrete class
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            interfaces: Vec::new(),
            is_interface: false,
            is_abstract: false,
            methods: Vec::new(),
            constructors: Vec::new(),
        }
    }

    /// Start an interface
    pub fn interface(name: impl Into<Arc<str>>) -> Self {
        let mut builder = Self::new(name);
        builder.is_interface = true;
        builder
    }

    /// Set the superclass
    pub fn extends(mut self, superclass: impl Into<Arc<str>>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    /// Add an implemented (or extended) interface
    pub fn implements(mut self, interface: impl Into<Arc<str>>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Mark the class abstract
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Add a method definition
    pub fn define(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a constructor definition
    pub fn define_constructor(mut self, constructor: ConstructorDef) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Add a public instance method
    pub fn method(
        self,
        name: impl Into<Arc<str>>,
        params: Vec<Type>,
        ret: Type,
        body: impl Fn(&Value, &[Value]) -> Result<Value, Thrown> + Send + Sync + 'static,
    ) -> Self {
        self.define(MethodDef::instance(name, params, ret, body))
    }

    /// Add a public static method
    pub fn static_method(
        self,
        name: impl Into<Arc<str>>,
        params: Vec<Type>,
        ret: Type,
        body: impl Fn(&[Value]) -> Result<Value, Thrown> + Send + Sync + 'static,
    ) -> Self {
        self.define(MethodDef::static_fn(name, params, ret, body))
    }

    /// Add a public abstract method
    pub fn abstract_method(self, name: impl Into<Arc<str>>, params: Vec<Type>, ret: Type) -> Self {
        self.define(MethodDef::abstract_fn(name, params, ret))
    }

    /// Add a public constructor
    pub fn constructor(
        self,
        params: Vec<Type>,
        init: impl Fn(&[Value]) -> Result<Vec<Value>, Thrown> + Send + Sync + 'static,
    ) -> Self {
        self.define_constructor(ConstructorDef::new(params, init))
    }
}
