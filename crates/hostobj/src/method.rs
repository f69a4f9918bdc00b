//! # Reflected methods
//!
//! The callable surface of a class is an explicit table from [`MethodName`] to a
//! type-erased zero-argument [`Method`]. Resolving a name is a map lookup with a
//! defined miss case, never an unchecked cast.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::sync::Arc;

use crate::object::Object;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Method names must contain at least one character.
    Empty,
}

impl std::fmt::Display for NameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "method name is empty"),
        }
    }
}

impl std::error::Error for NameError {}

/// Immutable, non-empty method identifier.
///
/// Cloning shares the underlying string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodName(Arc<str>);

impl MethodName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, NameError> {
        let name = name.as_ref();
        if name.is_empty() {
            return Err(NameError::Empty);
        }
        Ok(Self(Arc::from(name)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for MethodName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl std::fmt::Display for MethodName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for MethodName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for MethodName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for MethodName {
    type Error = NameError;

    fn try_from(name: &str) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

impl TryFrom<String> for MethodName {
    type Error = NameError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        Self::new(name)
    }
}

/// Signature shared by every reflected method: no arguments, no value.
///
/// Failures are reported through the `anyhow::Error`; a body may also panic,
/// which callers at a host boundary are expected to contain.
pub type MethodFn = dyn Fn(&Object) -> anyhow::Result<()> + Send + Sync;

/// A named, type-erased callable bound to no particular object.
#[derive(Clone)]
pub struct Method {
    name: MethodName,
    func: Arc<MethodFn>,
}

impl Method {
    pub fn new<F>(name: MethodName, func: F) -> Self
    where
        F: Fn(&Object) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self { name, func: Arc::new(func) }
    }

    pub(crate) fn from_shared(name: MethodName, func: Arc<MethodFn>) -> Self {
        Self { name, func }
    }

    pub fn name(&self) -> &MethodName {
        &self.name
    }

    /// Runs the method body against `object` on the calling thread.
    pub fn invoke(&self, object: &Object) -> anyhow::Result<()> {
        (self.func)(object)
    }
}

impl std::fmt::Debug for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Method").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Name-unique collection of methods.
#[derive(Clone, Debug, Default)]
pub struct MethodTable {
    methods: HashMap<MethodName, Method>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a method. Returns the rejected method if the name is taken.
    pub fn insert(&mut self, method: Method) -> Result<(), Method> {
        if self.methods.contains_key(method.name()) {
            return Err(method);
        }
        self.methods.insert(method.name().clone(), method);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &MethodName> {
        self.methods.keys()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_name_rejects_empty() {
        assert_eq!(MethodName::new(""), Err(NameError::Empty));
        assert_eq!(MethodName::try_from(String::new()), Err(NameError::Empty));
    }

    #[test]
    fn test_method_name_borrows_as_str() {
        let name = MethodName::new("ReceiveBeginPlay").unwrap();
        assert_eq!(name.as_str(), "ReceiveBeginPlay");
        assert_eq!(name.to_string(), "ReceiveBeginPlay");
        assert_eq!(format!("{:?}", name), "\"ReceiveBeginPlay\"");
    }

    #[test]
    fn test_table_rejects_duplicate_names() {
        let mut table = MethodTable::new();
        let name = MethodName::new("Tick").unwrap();

        table.insert(Method::new(name.clone(), |_| Ok(()))).unwrap();
        let rejected = table.insert(Method::new(name.clone(), |_| Ok(()))).unwrap_err();

        assert_eq!(rejected.name(), &name);
        assert_eq!(table.len(), 1);
        assert!(table.contains("Tick"));
        assert!(table.get("Nonexistent").is_none());
    }
}
