//! Core trait definitions for extensibility.
//!
//! - **ObjectListener**: observe object and class lifetime events raised by an
//!   [`ObjectArray`](crate::ObjectArray)

use std::sync::Arc;

use crate::class::Class;
use crate::object::Object;

/// Observer of an object array's lifetime events.
///
/// Notifications are delivered synchronously on the thread that caused them,
/// with no internal locks held, so a listener may call back into the array.
/// Every hook has an empty default.
pub trait ObjectListener: Send + Sync + 'static {
    /// A new object has been spawned and is already resolvable.
    fn on_object_created(&self, _object: &Arc<Object>) {}

    /// An object has been destroyed; its handle no longer resolves.
    fn on_object_destroyed(&self, _object: &Arc<Object>) {}

    /// A class is being unloaded. It has no live instances.
    fn on_class_unloaded(&self, _class: &Arc<Class>) {}

    /// The array is shutting down; no further events will be delivered.
    fn on_array_shutdown(&self) {}
}
