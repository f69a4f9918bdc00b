//! # Host classes
//!
//! A [`Class`] is the static shape of a family of objects: where it lives
//! (asset path), what it derives from, which interfaces it implements, its
//! class-default properties, and the methods it declares itself. Inherited
//! members are found by walking the parent chain, most derived first.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use crate::handles::ClassId;
use crate::method::Method;
use crate::method::MethodFn;
use crate::method::MethodTable;
use crate::object::Object;

/// A registered host class. Immutable once registered.
#[derive(Debug)]
pub struct Class {
    pub(crate) id: ClassId,
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) parent: Option<Arc<Class>>,
    pub(crate) interfaces: HashSet<String>,
    pub(crate) properties: HashMap<String, String>,
    pub(crate) methods: MethodTable,
}

impl Class {
    /// Starts describing a class. The asset path defaults to `name`.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    pub fn id(&self) -> ClassId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parent(&self) -> Option<&Arc<Class>> {
        self.parent.as_ref()
    }

    /// Methods declared on this class, excluding inherited ones.
    pub fn own_methods(&self) -> &MethodTable {
        &self.methods
    }

    /// This class followed by each ancestor up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = &Class> {
        std::iter::successors(Some(self), |class| class.parent.as_deref())
    }

    /// Whether `self` is `other` or derives from it.
    pub fn is_child_of(&self, other: &Class) -> bool {
        self.ancestors().any(|class| class.id == other.id)
    }

    /// Resolves a method through the class chain.
    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.ancestors().find_map(|class| class.methods.get(name))
    }

    /// Whether this class or an ancestor implements `interface`.
    pub fn implements(&self, interface: &str) -> bool {
        self.ancestors().any(|class| class.interfaces.contains(interface))
    }

    /// Class-default property value, falling back to ancestors.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.ancestors()
            .find_map(|class| class.properties.get(key))
            .map(String::as_str)
    }

    /// The nearest class in the chain, starting with `self`, whose own
    /// defaults declare `key`.
    pub fn property_owner(self: &Arc<Self>, key: &str) -> Option<Arc<Class>> {
        let mut class = self;
        loop {
            if class.properties.contains_key(key) {
                return Some(Arc::clone(class));
            }
            class = class.parent.as_ref()?;
        }
    }
}

/// Describes a class before registration with an
/// [`ObjectArray`](crate::ObjectArray).
pub struct ClassBuilder {
    pub(crate) name: String,
    pub(crate) path: Option<String>,
    pub(crate) parent: Option<Arc<Class>>,
    pub(crate) interfaces: HashSet<String>,
    pub(crate) properties: HashMap<String, String>,
    pub(crate) methods: Vec<(String, Arc<MethodFn>)>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            parent: None,
            interfaces: HashSet::new(),
            properties: HashMap::new(),
            methods: Vec::new(),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn parent(mut self, parent: &Arc<Class>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.insert(interface.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Declares a method. Name validity and uniqueness are checked at
    /// registration.
    pub fn method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Object) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.methods.push((name.into(), Arc::new(func)));
        self
    }
}
