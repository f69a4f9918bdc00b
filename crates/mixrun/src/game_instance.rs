//! # Game instance
//!
//! The process-lifetime host object that starts the script environment and
//! exposes the `FCall` event: host code raises `(function name, object)` pairs
//! through [`GameInstance::call_script`], and whatever the script bound to
//! `FCall` handles them.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::Weak;

use hostobj::ObjectHandle;

use crate::config::Config;
use crate::delegate::Delegate;
use crate::traits::ScriptEnv;

#[derive(Debug)]
pub enum Error {
    /// The script environment was dropped before the game instance started.
    ScriptEnvUnavailable,
    /// The entry script failed to start.
    ScriptStart { entry: String, source: anyhow::Error },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScriptEnvUnavailable => write!(f, "Script environment is not available"),
            Self::ScriptStart { entry, source } => write!(f, "Failed to start script '{}': {:#}", entry, source),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ScriptStart { source, .. } => Some(&**source),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Arguments carried by the `FCall` event: the raw function name as the host
/// supplied it, and the target object.
pub type FCallArgs = (String, ObjectHandle);

pub struct GameInstance {
    handle: ObjectHandle,
    script_entry: String,
    script: Mutex<Option<Weak<dyn ScriptEnv>>>,
    fcall: Delegate<FCallArgs>,
}

impl GameInstance {
    /// `handle` is this game instance's own host object.
    pub fn new(handle: ObjectHandle, config: &Config) -> Self {
        Self {
            handle,
            script_entry: config.script_entry.clone(),
            script: Mutex::new(None),
            fcall: Delegate::new("FCall"),
        }
    }

    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    pub fn script_entry(&self) -> &str {
        &self.script_entry
    }

    /// The event scripts bind to receive host calls.
    pub fn fcall(&self) -> &Delegate<FCallArgs> {
        &self.fcall
    }

    pub fn init(&self) {
        tracing::debug!(handle = %self.handle, "game instance init");
    }

    /// Starts the configured entry script in `env`, passing this game instance
    /// to it. Only a weak reference to `env` is kept.
    pub fn on_start(&self, env: &Arc<dyn ScriptEnv>) -> Result<()> {
        *self.script() = Some(Arc::downgrade(env));

        let env = self.script_env().ok_or(Error::ScriptEnvUnavailable)?;
        env.start(&self.script_entry, self)
            .map_err(|source| Error::ScriptStart { entry: self.script_entry.clone(), source })?;

        tracing::info!(entry = %self.script_entry, "loading script success");
        Ok(())
    }

    /// Releases the script environment and unbinds `FCall`.
    pub fn shutdown(&self) {
        self.script().take();
        self.fcall.unbind();
        tracing::debug!(handle = %self.handle, "game instance shut down");
    }

    /// The running script environment, if it is still alive.
    pub fn script_env(&self) -> Option<Arc<dyn ScriptEnv>> {
        self.script().as_ref().and_then(Weak::upgrade)
    }

    /// Raises `FCall`. Returns whether a handler was bound.
    pub fn call_script(&self, function_name: &str, object: ObjectHandle) -> bool {
        let bound = self.fcall.execute_if_bound((function_name.to_string(), object));
        if !bound {
            tracing::debug!(function = function_name, %object, "FCall is not bound");
        }
        bound
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Option<Weak<dyn ScriptEnv>>> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for GameInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameInstance")
            .field("handle", &self.handle)
            .field("script_entry", &self.script_entry)
            .field("fcall", &self.fcall)
            .finish_non_exhaustive()
    }
}
