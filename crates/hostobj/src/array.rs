//! # Object Array
//!
//! Central registry for the host object model. Owns every registered class and
//! every live object, hands out generational [`ObjectHandle`]s, and tells
//! listeners when objects appear or disappear.
//!
//! Uses DashMap for concurrent access without global locking. Listener
//! notifications are delivered from a snapshot, never while a map guard is
//! held, so listeners may spawn, destroy or resolve from inside a callback.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::class::Class;
use crate::class::ClassBuilder;
use crate::handles::ClassId;
use crate::handles::ListenerId;
use crate::handles::ObjectHandle;
use crate::method::Method;
use crate::method::MethodName;
use crate::method::MethodTable;
use crate::object::Object;
use crate::traits::ObjectListener;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    ClassNotFound(ClassId),
    ClassPathNotFound(String),
    DuplicateClassPath(String),
    /// The parent class given to a builder is not registered with this array.
    ParentNotRegistered(String),
    InvalidMethodName { class: String },
    DuplicateMethod { class: String, method: String },
    /// The class still has live instances or registered subclasses.
    ClassInUse(ClassId),
    ObjectNotFound(ObjectHandle),
    /// Every serial number has been handed out once.
    SerialsExhausted,
    Shutdown,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClassNotFound(id) => write!(f, "Class not found: {}", id),
            Self::ClassPathNotFound(path) => write!(f, "Class not found at path '{}'", path),
            Self::DuplicateClassPath(path) => write!(f, "Class path '{}' is already registered", path),
            Self::ParentNotRegistered(name) => write!(f, "Parent class '{}' is not registered", name),
            Self::InvalidMethodName { class } => write!(f, "Class '{}' declares a method with an empty name", class),
            Self::DuplicateMethod { class, method } => write!(f, "Class '{}' declares method '{}' more than once", class, method),
            Self::ClassInUse(id) => write!(f, "Class {} still has instances or subclasses", id),
            Self::ObjectNotFound(handle) => write!(f, "Object not found: {}", handle),
            Self::SerialsExhausted => write!(f, "Object serial numbers are exhausted"),
            Self::Shutdown => write!(f, "Object array has shut down"),
        }
    }
}

impl std::error::Error for Error {}

pub type Result<T> = std::result::Result<T, Error>;

/// The registry of classes and live objects.
pub struct ObjectArray {
    classes: DashMap<ClassId, Arc<Class>>,
    class_paths: DashMap<String, ClassId>,
    objects: DashMap<u32, Arc<Object>>,
    listeners: DashMap<ListenerId, Arc<dyn ObjectListener>>,
    free_slots: Mutex<Vec<u32>>,
    next_slot: AtomicU32,
    next_serial: AtomicU32,
    next_class_id: AtomicU64,
    next_listener_id: AtomicU64,
    shut_down: AtomicBool,
}

impl ObjectArray {
    pub fn new() -> Self {
        Self {
            classes: DashMap::new(),
            class_paths: DashMap::new(),
            objects: DashMap::new(),
            listeners: DashMap::new(),
            free_slots: Mutex::new(Vec::new()),
            next_slot: AtomicU32::new(0),
            next_serial: AtomicU32::new(1),
            next_class_id: AtomicU64::new(1),
            next_listener_id: AtomicU64::new(1),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Validates and registers a class described by `builder`.
    pub fn register_class(&self, builder: ClassBuilder) -> Result<Arc<Class>> {
        self.ensure_running()?;

        let ClassBuilder { name, path, parent, interfaces, properties, methods: pending } = builder;
        let path = path.unwrap_or_else(|| name.clone());

        if let Some(parent) = &parent {
            let registered = self.classes
                .get(&parent.id)
                .is_some_and(|entry| Arc::ptr_eq(entry.value(), parent));
            if !registered {
                return Err(Error::ParentNotRegistered(parent.name.clone()));
            }
        }

        let mut methods = MethodTable::new();
        for (method_name, func) in pending {
            let method_name = MethodName::new(&method_name)
                .map_err(|_| Error::InvalidMethodName { class: name.clone() })?;
            methods
                .insert(Method::from_shared(method_name, func))
                .map_err(|rejected| Error::DuplicateMethod {
                    class: name.clone(),
                    method: rejected.name().to_string(),
                })?;
        }

        let id = ClassId(self.next_class_id.fetch_add(1, Ordering::Relaxed));
        match self.class_paths.entry(path.clone()) {
            Entry::Occupied(_) => return Err(Error::DuplicateClassPath(path)),
            Entry::Vacant(slot) => { slot.insert(id); }
        }

        let class = Arc::new(Class { id, name, path, parent, interfaces, properties, methods });
        self.classes.insert(id, Arc::clone(&class));

        tracing::debug!(class = %class.name, path = %class.path, %id, "registered class");
        Ok(class)
    }

    pub fn get_class(&self, id: ClassId) -> Result<Arc<Class>> {
        self.classes
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(Error::ClassNotFound(id))
    }

    pub fn find_class(&self, path: &str) -> Result<Arc<Class>> {
        let id = self.class_paths
            .get(path)
            .map(|entry| *entry.value())
            .ok_or_else(|| Error::ClassPathNotFound(path.to_string()))?;
        self.get_class(id)
    }

    /// Snapshot of every registered class, in registration order.
    pub fn classes(&self) -> Vec<Arc<Class>> {
        let mut classes: Vec<_> = self.classes.iter().map(|entry| entry.value().clone()).collect();
        classes.sort_by_key(|class| class.id);
        classes
    }

    /// Creates an instance of the class and announces it to listeners.
    pub fn spawn(&self, class_id: ClassId, name: impl Into<String>) -> Result<ObjectHandle> {
        self.ensure_running()?;
        let class = self.get_class(class_id)?;

        let serial = self.next_serial
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |serial| serial.checked_add(1))
            .map_err(|_| Error::SerialsExhausted)?;
        let index = self.free_slots()
            .pop()
            .unwrap_or_else(|| self.next_slot.fetch_add(1, Ordering::Relaxed));
        let handle = ObjectHandle { index, serial };

        let object = Arc::new(Object::new(handle, class, name.into()));
        self.objects.insert(index, Arc::clone(&object));

        tracing::trace!(object = %object, "spawned object");
        for listener in self.listeners() {
            listener.on_object_created(&object);
        }

        Ok(handle)
    }

    pub fn spawn_by_path(&self, path: &str, name: impl Into<String>) -> Result<ObjectHandle> {
        let class = self.find_class(path)?;
        self.spawn(class.id, name)
    }

    /// Returns the live object behind `handle`, or `None` if it was destroyed
    /// (or never existed).
    pub fn resolve(&self, handle: ObjectHandle) -> Option<Arc<Object>> {
        if handle.is_none() {
            return None;
        }
        self.objects
            .get(&handle.index)
            .filter(|entry| entry.value().handle.serial == handle.serial)
            .map(|entry| entry.value().clone())
    }

    pub fn is_valid(&self, handle: ObjectHandle) -> bool {
        self.resolve(handle).is_some()
    }

    /// Destroys the object. Outstanding handles stop resolving immediately;
    /// callers already holding the `Arc<Object>` keep it until they drop it.
    pub fn destroy(&self, handle: ObjectHandle) -> Result<()> {
        let (index, object) = self.objects
            .remove_if(&handle.index, |_, object| object.handle.serial == handle.serial)
            .ok_or(Error::ObjectNotFound(handle))?;
        self.free_slots().push(index);

        tracing::trace!(object = %object, "destroyed object");
        for listener in self.listeners() {
            listener.on_object_destroyed(&object);
        }
        Ok(())
    }

    /// Handles of every live instance of exactly this class.
    pub fn objects_of_class(&self, class_id: ClassId) -> Vec<ObjectHandle> {
        self.objects
            .iter()
            .filter(|entry| entry.value().class.id == class_id)
            .map(|entry| entry.value().handle)
            .collect()
    }

    /// Removes a class that has no live instances and no registered subclasses.
    pub fn unload_class(&self, class_id: ClassId) -> Result<()> {
        let class = self.get_class(class_id)?;

        let has_instances = self.objects.iter().any(|entry| entry.value().class.id == class_id);
        let has_subclasses = self.classes.iter().any(|entry| {
            entry.value().parent.as_ref().is_some_and(|parent| parent.id == class_id)
        });
        if has_instances || has_subclasses {
            return Err(Error::ClassInUse(class_id));
        }

        self.classes.remove(&class_id);
        self.class_paths.remove(&class.path);

        tracing::debug!(class = %class.name, %class_id, "unloaded class");
        for listener in self.listeners() {
            listener.on_class_unloaded(&class);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn add_listener(&self, listener: Arc<dyn ObjectListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.insert(id, listener);
        id
    }

    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Notifies listeners, then releases every object and class. Further
    /// registrations and spawns fail with [`Error::Shutdown`].
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return;
        }

        for listener in self.listeners() {
            listener.on_array_shutdown();
        }

        let objects = self.objects.len();
        self.listeners.clear();
        self.objects.clear();
        self.class_paths.clear();
        self.classes.clear();
        self.free_slots().clear();

        tracing::debug!(objects, "object array shut down");
    }

    #[cfg(test)]
    pub(crate) fn set_next_serial(&self, serial: u32) {
        self.next_serial.store(serial, Ordering::Relaxed);
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    fn ensure_running(&self) -> Result<()> {
        if self.is_shut_down() {
            return Err(Error::Shutdown);
        }
        Ok(())
    }

    fn listeners(&self) -> Vec<Arc<dyn ObjectListener>> {
        let mut listeners: Vec<_> = self.listeners
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        // registration order
        listeners.sort_by_key(|(id, _)| id.0);
        listeners.into_iter().map(|(_, listener)| listener).collect()
    }

    fn free_slots(&self) -> std::sync::MutexGuard<'_, Vec<u32>> {
        self.free_slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ObjectArray {
    fn default() -> Self {
        Self::new()
    }
}
