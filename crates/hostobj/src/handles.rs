//! Type-safe handles for host resources.
//!
//! Objects, classes and listeners are addressed through strongly-typed handles
//! rather than raw integers, so a `ClassId` can never be passed where an
//! `ObjectHandle` is expected.

/// Non-owning, generational reference to a host object.
///
/// The `index` names a slot in the [`ObjectArray`](crate::ObjectArray); the
/// `serial` names the particular object that occupied it. Slots are recycled
/// but serials never are, so a handle captured before its object was destroyed
/// stops resolving instead of aliasing whatever lives in the slot now.
///
/// Holding a handle keeps nothing alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub index: u32,
    pub serial: u32,
}

impl ObjectHandle {
    /// The null handle. Never resolves.
    pub const NONE: ObjectHandle = ObjectHandle { index: u32::MAX, serial: 0 };

    pub fn is_none(&self) -> bool {
        self.serial == 0
    }
}

impl Default for ObjectHandle {
    fn default() -> Self {
        Self::NONE
    }
}

impl std::fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "object-none")
        } else {
            write!(f, "object-{}#{}", self.index, self.serial)
        }
    }
}

/// Strong type for class identifiers.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClassId(pub u64);

impl std::fmt::Display for ClassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "class-{}", self.0)
    }
}

/// Strong type for registered object listeners.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct ListenerId(pub u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}
