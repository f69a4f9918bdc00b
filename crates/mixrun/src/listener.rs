//! # Auto-mixin listener
//!
//! Watches an [`ObjectArray`] and applies mixins without any explicit call:
//!
//! - when an instance of a class implementing the mixin interface is created,
//!   the `MixinModulePath` default names the script module to apply, once per
//!   class. The mixin goes on the class that declares that default, so the
//!   first instance may well be of a subclass;
//! - when a mixed class is unloaded, its mixin is removed.
//!
//! Mixing always happens on the game thread. Notifications raised on other
//! threads are queued on the [`GameThread`] and applied at the next pump.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use hostobj::Class;
use hostobj::ClassId;
use hostobj::ListenerId;
use hostobj::Object;
use hostobj::ObjectArray;
use hostobj::ObjectListener;

use crate::config::MIXIN_MODULE_PATH;
use crate::game_thread::GameThread;
use crate::mixin::MixinRegistry;

/// Applies and removes mixins as classes come and go.
pub struct AutoMixinListener {
    mixins: Arc<MixinRegistry>,
    game_thread: GameThread,
    interface: String,
    initialized: AtomicBool,
    registration: Mutex<Option<(Weak<ObjectArray>, ListenerId)>>,
    processed: Arc<Mutex<HashSet<ClassId>>>,
}

impl AutoMixinListener {
    pub fn new(mixins: Arc<MixinRegistry>, game_thread: GameThread, interface: impl Into<String>) -> Self {
        Self {
            mixins,
            game_thread,
            interface: interface.into(),
            initialized: AtomicBool::new(false),
            registration: Mutex::new(None),
            processed: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Starts listening to `objects`. Calling it again is a no-op.
    pub fn initialize(self: &Arc<Self>, objects: &Arc<ObjectArray>) {
        let mut registration = self.registration();
        if registration.is_some() {
            return;
        }

        let id = objects.add_listener(self.clone());
        *registration = Some((Arc::downgrade(objects), id));
        self.initialized.store(true, Ordering::Release);

        tracing::debug!(interface = %self.interface, "auto mixin listener initialized");
    }

    /// Stops listening and forgets which classes were processed.
    pub fn shutdown(&self) {
        let Some((objects, id)) = self.registration().take() else {
            return;
        };
        self.initialized.store(false, Ordering::Release);

        if let Some(objects) = objects.upgrade() {
            objects.remove_listener(id);
        }
        self.processed().clear();

        tracing::debug!("auto mixin listener shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn is_processed(&self, class_id: ClassId) -> bool {
        self.processed().contains(&class_id)
    }

    /// Processes every registered class that implements the mixin interface
    /// and has not been seen yet. Returns how many were mixed.
    pub fn scan_existing_objects(&self) -> usize {
        if !self.is_initialized() {
            return 0;
        }
        let Some(objects) = self.objects() else {
            return 0;
        };

        let mut mixed = 0;
        for class in objects.classes() {
            let Some(owner) = self.claim(&class) else {
                continue;
            };
            if execute_mixin(&self.mixins, &owner) {
                mixed += 1;
            }
        }

        if mixed > 0 {
            tracing::info!(count = mixed, "scanned existing classes");
        }
        mixed
    }

    /// For a mixin-capable class, finds the class declaring the module path
    /// and marks it processed. `None` if there is nothing new to mix.
    fn claim(&self, class: &Arc<Class>) -> Option<Arc<Class>> {
        if !class.implements(&self.interface) {
            return None;
        }
        let owner = class
            .property_owner(MIXIN_MODULE_PATH)
            .unwrap_or_else(|| Arc::clone(class));
        self.processed().insert(owner.id()).then_some(owner)
    }

    fn objects(&self) -> Option<Arc<ObjectArray>> {
        self.registration().as_ref().and_then(|(objects, _)| objects.upgrade())
    }

    fn registration(&self) -> MutexGuard<'_, Option<(Weak<ObjectArray>, ListenerId)>> {
        self.registration.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn processed(&self) -> MutexGuard<'_, HashSet<ClassId>> {
        lock_processed(&self.processed)
    }
}

impl ObjectListener for AutoMixinListener {
    fn on_object_created(&self, object: &Arc<Object>) {
        if !self.is_initialized() {
            return;
        }

        let Some(owner) = self.claim(object.class()) else {
            return;
        };

        let mixins = self.mixins.clone();
        let processed = self.processed.clone();
        self.game_thread.run_or_post(move || {
            // unloaded, or the listener shut down, while queued
            if !lock_processed(&processed).contains(&owner.id()) {
                tracing::debug!(class = %owner.name(), "pending mixin dropped");
                return;
            }
            execute_mixin(&mixins, &owner);
        });
    }

    fn on_class_unloaded(&self, class: &Arc<Class>) {
        if !self.is_initialized() {
            return;
        }
        if !self.processed().remove(&class.id()) {
            return;
        }

        let mixins = self.mixins.clone();
        let class = class.clone();
        self.game_thread.run_or_post(move || {
            if mixins.unmix(class.id()) {
                tracing::info!(class = %class.name(), "Unmixin");
            }
        });
    }

    fn on_array_shutdown(&self) {
        self.shutdown();
    }
}

fn lock_processed(processed: &Mutex<HashSet<ClassId>>) -> MutexGuard<'_, HashSet<ClassId>> {
    processed.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Applies the module named by the class default, if any. Returns whether a
/// mixin was applied.
fn execute_mixin(mixins: &MixinRegistry, class: &Class) -> bool {
    let module_path = class.property(MIXIN_MODULE_PATH).unwrap_or_default();
    if module_path.is_empty() {
        return false;
    }

    match mixins.mix(class, module_path) {
        Ok(()) => {
            tracing::info!(module = %module_path, class = %class.name(), "Mixin");
            true
        }
        Err(e) => {
            tracing::warn!(module = %module_path, class = %class.name(), error = %e, "mixin failed");
            false
        }
    }
}
