//! Single-cast dynamic delegates.

use std::sync::Arc;
use std::sync::PoisonError;
use std::sync::RwLock;

type Handler<A> = Arc<dyn Fn(A) + Send + Sync>;

/// A named event slot holding at most one handler.
///
/// Firing clones the handler out before calling it, so a handler may rebind or
/// unbind its own delegate.
pub struct Delegate<A> {
    name: &'static str,
    handler: RwLock<Option<Handler<A>>>,
}

impl<A> Delegate<A> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            handler: RwLock::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Installs `handler`, replacing any previous one.
    pub fn bind(&self, handler: impl Fn(A) + Send + Sync + 'static) {
        let previous = self.handler
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::new(handler));
        if previous.is_some() {
            tracing::debug!(delegate = self.name, "rebound delegate");
        }
    }

    pub fn unbind(&self) {
        self.handler.write().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub fn is_bound(&self) -> bool {
        self.handler.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Calls the handler with `args` if one is bound. Returns whether it ran.
    pub fn execute_if_bound(&self, args: A) -> bool {
        let handler = self.handler.read().unwrap_or_else(PoisonError::into_inner).clone();
        match handler {
            Some(handler) => {
                handler(args);
                true
            }
            None => false,
        }
    }
}

impl<A> std::fmt::Debug for Delegate<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegate")
            .field("name", &self.name)
            .field("bound", &self.is_bound())
            .finish()
    }
}
