//! # Runtime
//!
//! Owns the pieces a scripting bridge needs for its whole lifetime: the host
//! object array, the mixin registry, the game-thread queue and the auto-mixin
//! listener that ties the first two together.

use std::sync::Arc;

use hostobj::MethodName;
use hostobj::ObjectArray;
use hostobj::ObjectHandle;

use crate::config::Config;
use crate::dispatch::DispatchRequest;
use crate::dispatch::DispatchResult;
use crate::dispatch::Dispatcher;
use crate::game_thread::GameThread;
use crate::listener::AutoMixinListener;
use crate::mixin::MixinRegistry;

pub struct Runtime {
    config: Config,
    objects: Arc<ObjectArray>,
    mixins: Arc<MixinRegistry>,
    game_thread: GameThread,
    listener: Arc<AutoMixinListener>,
}

impl Runtime {
    /// Creates a runtime with an empty object array. The calling thread becomes
    /// the game thread.
    pub fn new(config: Config) -> Self {
        Self::with_objects(config, Arc::new(ObjectArray::new()))
    }

    /// Creates a runtime over an existing object array. Classes already
    /// registered there are scanned for mixins when auto-mixin is enabled.
    pub fn with_objects(config: Config, objects: Arc<ObjectArray>) -> Self {
        let mixins = Arc::new(MixinRegistry::new());
        let game_thread = GameThread::current();
        let listener = Arc::new(AutoMixinListener::new(
            mixins.clone(),
            game_thread.clone(),
            config.mixin_interface.clone(),
        ));

        if config.auto_mixin {
            listener.initialize(&objects);
            listener.scan_existing_objects();
        }

        tracing::debug!(entry = %config.script_entry, auto_mixin = config.auto_mixin, "runtime created");

        Self { config, objects, mixins, game_thread, listener }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn objects(&self) -> &Arc<ObjectArray> {
        &self.objects
    }

    pub fn mixins(&self) -> &Arc<MixinRegistry> {
        &self.mixins
    }

    pub fn game_thread(&self) -> &GameThread {
        &self.game_thread
    }

    pub fn listener(&self) -> &Arc<AutoMixinListener> {
        &self.listener
    }

    /// Calls the method `name` on the object behind `handle`.
    /// See [`Dispatcher::dispatch`].
    pub fn dispatch(&self, handle: ObjectHandle, name: &MethodName) -> DispatchResult {
        Dispatcher::dispatch(
            &self.objects,
            &self.mixins,
            DispatchRequest::new(handle, name.clone()),
        )
    }

    /// Runs work queued for the game thread. Returns the number of tasks run.
    pub fn pump(&self) -> usize {
        self.game_thread.pump()
    }

    /// Detaches the listener and shuts the object array down.
    pub fn shutdown(&self) {
        self.listener.shutdown();
        self.objects.shutdown();
        tracing::debug!("runtime shut down");
    }
}
