//! # hostobj
//!
//! A small reflection-style host object model: the classes, objects and weak
//! handles a scripting bridge plugs into.
//!
//! ## Core Concepts
//!
//! - **ObjectArray**: the registry of classes and live objects
//! - **Class**: asset path, parent chain, interfaces, class-default properties
//!   and an explicit method table
//! - **ObjectHandle**: generational, non-owning reference that stops resolving
//!   once its object is destroyed
//! - **ObjectListener**: observer of object creation/destruction and class
//!   unloads
//!
//! ## Example
//!
//! ```rust,no_run
//! use hostobj::{Class, ObjectArray};
//!
//! # fn example() -> anyhow::Result<()> {
//! let objects = ObjectArray::new();
//! let pawn = objects.register_class(
//!     Class::builder("BP_Pawn_C").method("ReceiveBeginPlay", |_| Ok(())),
//! )?;
//!
//! let handle = objects.spawn(pawn.id(), "Pawn_0")?;
//! let object = objects.resolve(handle).expect("just spawned");
//! object.class().find_method("ReceiveBeginPlay").expect("declared").invoke(&object)?;
//! # Ok(())
//! # }
//! ```

pub mod array;
pub mod class;
pub mod handles;
pub mod method;
pub mod object;
pub mod traits;

pub use array::Error;
pub use array::ObjectArray;
pub use array::Result;
pub use class::Class;
pub use class::ClassBuilder;
pub use handles::ClassId;
pub use handles::ListenerId;
pub use handles::ObjectHandle;
pub use method::Method;
pub use method::MethodFn;
pub use method::MethodName;
pub use method::MethodTable;
pub use method::NameError;
pub use object::Object;
pub use traits::ObjectListener;

#[cfg(test)]
mod tests;
