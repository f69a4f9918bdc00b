//! # Dynamic Dispatch Bridge
//!
//! Resolves a method by name against an object handle and invokes it on the
//! calling thread. Every input maps to a defined result:
//!
//! - the handle no longer names a live object → [`DispatchError::HandleInvalid`]
//! - nothing callable by that name on the object's class chain (mixin hooks
//!   included) → [`DispatchError::MethodNotFound`]
//! - the method body returns an error or panics →
//!   [`DispatchError::InvocationFailure`]
//!
//! The dispatcher is stateless: no caching between calls, no retries, no
//! logging. What to do with a failure is the caller's decision.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use hostobj::MethodName;
use hostobj::ObjectArray;
use hostobj::ObjectHandle;

use crate::mixin::MixinRegistry;

/// One `(handle, name)` pair raised by an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchRequest {
    pub handle: ObjectHandle,
    pub name: MethodName,
}

impl DispatchRequest {
    pub fn new(handle: ObjectHandle, name: MethodName) -> Self {
        Self { handle, name }
    }
}

/// Why a dispatch did not run its method to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The object behind the handle was destroyed (or never existed).
    HandleInvalid { handle: ObjectHandle, name: MethodName },
    /// The object's class chain exposes nothing callable by that name.
    MethodNotFound { handle: ObjectHandle, class: String, name: MethodName },
    /// The method ran and failed. `reason` is the error chain or panic message.
    InvocationFailure {
        handle: ObjectHandle,
        object: String,
        name: MethodName,
        reason: String,
    },
}

impl DispatchError {
    pub fn handle(&self) -> ObjectHandle {
        match self {
            Self::HandleInvalid { handle, .. }
            | Self::MethodNotFound { handle, .. }
            | Self::InvocationFailure { handle, .. } => *handle,
        }
    }

    pub fn name(&self) -> &MethodName {
        match self {
            Self::HandleInvalid { name, .. }
            | Self::MethodNotFound { name, .. }
            | Self::InvocationFailure { name, .. } => name,
        }
    }
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HandleInvalid { handle, name } => {
                write!(f, "Cannot call '{}': {} is no longer valid", name, handle)
            }
            Self::MethodNotFound { handle, class, name } => {
                write!(f, "Method '{}' not found on {} ({})", name, class, handle)
            }
            Self::InvocationFailure { handle, object, name, reason } => {
                write!(f, "Method '{}' failed on {} ({}): {}", name, object, handle, reason)
            }
        }
    }
}

impl std::error::Error for DispatchError {}

pub type DispatchResult = std::result::Result<(), DispatchError>;

/// Stateless name-to-method dispatch.
pub struct Dispatcher;

impl Dispatcher {
    /// Executes one dispatch request.
    ///
    /// No internal lock is held while the method runs, so the body may spawn,
    /// destroy or dispatch further. Destroying its own object mid-call is
    /// allowed; the call completes on the object it started with.
    pub fn dispatch(
        objects: &ObjectArray,
        mixins: &MixinRegistry,
        request: DispatchRequest,
    ) -> DispatchResult {
        let DispatchRequest { handle, name } = request;

        let Some(object) = objects.resolve(handle) else {
            return Err(DispatchError::HandleInvalid { handle, name });
        };

        let Some(method) = mixins.resolve(object.class(), name.as_str()) else {
            return Err(DispatchError::MethodNotFound {
                handle,
                class: object.class().name().to_string(),
                name,
            });
        };

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| method.invoke(&object)));

        let reason = match outcome {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(e)) => format!("{:#}", e),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };

        Err(DispatchError::InvocationFailure {
            handle,
            object: object.name().to_string(),
            name,
            reason,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "non-string panic payload"
    }
}
