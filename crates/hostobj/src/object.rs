//! Live host objects and their per-instance data.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::class::Class;
use crate::handles::ObjectHandle;

type UserData = anymap::Map<dyn anymap::any::Any + Send + Sync>;

/// A live instance of a [`Class`].
///
/// Objects are owned by the [`ObjectArray`](crate::ObjectArray); everyone else
/// refers to them through an [`ObjectHandle`]. Per-object state that does not
/// belong to the class (script-side fields, for instance) lives in a typed
/// user-data map keyed by Rust type.
pub struct Object {
    pub(crate) handle: ObjectHandle,
    pub(crate) class: Arc<Class>,
    pub(crate) name: String,
    user_data: Mutex<UserData>,
}

impl Object {
    pub(crate) fn new(handle: ObjectHandle, class: Arc<Class>, name: String) -> Self {
        Self {
            handle,
            class,
            name,
            user_data: Mutex::new(anymap::Map::new()),
        }
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub fn class(&self) -> &Arc<Class> {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores `val`, replacing any previous value of the same type.
    pub fn insert_data<T: Send + Sync + 'static>(&self, val: T) -> Option<T> {
        self.user_data().insert(val)
    }

    pub fn has_data<T: Send + Sync + 'static>(&self) -> bool {
        self.user_data().contains::<T>()
    }

    /// Runs `f` on the stored value of type `T`, if there is one.
    ///
    /// The data lock is held for the duration of `f`.
    pub fn with_data<T, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R>
    where
        T: Send + Sync + 'static,
    {
        self.user_data().get_mut::<T>().map(f)
    }

    pub fn remove_data<T: Send + Sync + 'static>(&self) -> Option<T> {
        self.user_data().remove::<T>()
    }

    // a method body that panicked mid-update leaves the map usable
    fn user_data(&self) -> std::sync::MutexGuard<'_, UserData> {
        self.user_data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Object")
            .field("handle", &self.handle)
            .field("class", &self.class.name())
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for Object {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}, {})", self.name, self.class.name(), self.handle)
    }
}
