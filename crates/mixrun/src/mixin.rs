//! # Mixins
//!
//! A mixin augments a host class with script-side hooks by explicit
//! composition: it names the class it targets (by asset path) and carries a
//! table of hook methods. Applying a mixin records it against the class; method
//! resolution then consults the hooks before the class's own methods.
//!
//! Mixins are published as script modules. Applying one is a two-step lookup,
//! class → module path → mixin, mirroring how an engine class names the script
//! file that augments it.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use hostobj::Class;
use hostobj::ClassId;
use hostobj::Method;
use hostobj::MethodName;
use hostobj::MethodTable;
use hostobj::NameError;
use hostobj::Object;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No script module is registered under this path.
    ModuleNotFound(String),
    /// A script module is already registered under this path.
    DuplicateModule(String),
    /// The module's mixin targets a different class.
    TargetMismatch { module: String, expected: String, found: String },
    /// The class already has a mixin applied.
    AlreadyMixed(ClassId),
    InvalidHookName(NameError),
    DuplicateHook(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModuleNotFound(path) => write!(f, "Script module '{}' not found", path),
            Self::DuplicateModule(path) => write!(f, "Script module '{}' is already registered", path),
            Self::TargetMismatch { module, expected, found } => write!(
                f,
                "Module '{}' mixes into '{}', not '{}'",
                module, expected, found
            ),
            Self::AlreadyMixed(id) => write!(f, "Class {} already has a mixin applied", id),
            Self::InvalidHookName(e) => write!(f, "Invalid hook name: {}", e),
            Self::DuplicateHook(name) => write!(f, "Hook '{}' is declared more than once", name),
        }
    }
}

impl std::error::Error for Error {}

impl From<NameError> for Error {
    fn from(e: NameError) -> Self {
        Self::InvalidHookName(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// How a mixin's hooks propagate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MixinOptions {
    /// Hooks are visible to instances of classes derived from the target, not
    /// only to instances of the target itself.
    pub inherit: bool,
}

/// A set of hooks targeting one host class.
#[derive(Clone, Debug)]
pub struct Mixin {
    target: String,
    options: MixinOptions,
    hooks: MethodTable,
}

impl Mixin {
    /// A mixin for the class registered at `target` (its asset path).
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            options: MixinOptions::default(),
            hooks: MethodTable::new(),
        }
    }

    pub fn with_options(mut self, options: MixinOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds a hook. Hooks share the reflected method signature.
    pub fn hook<F>(mut self, name: &str, func: F) -> Result<Self>
    where
        F: Fn(&Object) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let name = MethodName::new(name)?;
        self.hooks
            .insert(Method::new(name, func))
            .map_err(|rejected| Error::DuplicateHook(rejected.name().to_string()))?;
        Ok(self)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn options(&self) -> MixinOptions {
        self.options
    }

    pub fn hooks(&self) -> &MethodTable {
        &self.hooks
    }

    /// Whether the hooks of this mixin, applied to `mixed`, are visible to an
    /// instance of `class`.
    pub fn applies_to(&self, mixed: &Class, class: &Class) -> bool {
        class.id() == mixed.id() || (self.options.inherit && class.is_child_of(mixed))
    }
}

/// Registry of script modules and the mixins applied to classes.
#[derive(Default)]
pub struct MixinRegistry {
    modules: DashMap<String, Arc<Mixin>>,
    applied: DashMap<ClassId, Applied>,
}

#[derive(Clone)]
struct Applied {
    module: String,
    mixin: Arc<Mixin>,
}

impl MixinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `mixin` as the script module at `module_path`.
    pub fn register_module(&self, module_path: impl Into<String>, mixin: Mixin) -> Result<()> {
        let module_path = module_path.into();
        match self.modules.entry(module_path) {
            Entry::Occupied(entry) => Err(Error::DuplicateModule(entry.key().clone())),
            Entry::Vacant(entry) => {
                tracing::debug!(module = %entry.key(), target = %mixin.target, "registered script module");
                entry.insert(Arc::new(mixin));
                Ok(())
            }
        }
    }

    pub fn module(&self, module_path: &str) -> Option<Arc<Mixin>> {
        self.modules.get(module_path).map(|entry| entry.value().clone())
    }

    /// Loads the module at `module_path` and applies its mixin to `class`.
    pub fn mix(&self, class: &Class, module_path: &str) -> Result<()> {
        let mixin = self.module(module_path)
            .ok_or_else(|| Error::ModuleNotFound(module_path.to_string()))?;

        if mixin.target != class.path() {
            return Err(Error::TargetMismatch {
                module: module_path.to_string(),
                expected: mixin.target.clone(),
                found: class.path().to_string(),
            });
        }

        match self.applied.entry(class.id()) {
            Entry::Occupied(_) => Err(Error::AlreadyMixed(class.id())),
            Entry::Vacant(entry) => {
                entry.insert(Applied { module: module_path.to_string(), mixin });
                Ok(())
            }
        }
    }

    /// Removes whatever mixin is applied to the class. Returns whether one was.
    pub fn unmix(&self, class_id: ClassId) -> bool {
        self.applied.remove(&class_id).is_some()
    }

    pub fn is_mixed(&self, class_id: ClassId) -> bool {
        self.applied.contains_key(&class_id)
    }

    /// The module path and mixin applied to the class, if any.
    pub fn applied(&self, class_id: ClassId) -> Option<(String, Arc<Mixin>)> {
        self.applied
            .get(&class_id)
            .map(|entry| (entry.module.clone(), entry.mixin.clone()))
    }

    /// Resolves `name` for an instance of `class`.
    ///
    /// Walks the class chain from most derived to root. At each level a hook of
    /// a mixin applied to that level wins over the level's own method, so a
    /// subclass's native override still shadows a base-class hook.
    pub fn resolve(&self, class: &Class, name: &str) -> Option<Method> {
        for level in class.ancestors() {
            if let Some((_, mixin)) = self.applied(level.id()) {
                if mixin.applies_to(level, class) {
                    if let Some(hook) = mixin.hooks.get(name) {
                        return Some(hook.clone());
                    }
                }
            }
            if let Some(method) = level.own_methods().get(name) {
                return Some(method.clone());
            }
        }
        None
    }
}
