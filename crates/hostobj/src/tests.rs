//! Tests for the object array, classes and listeners.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::Weak;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use crate::Class;
use crate::Error;
use crate::Object;
use crate::ObjectArray;
use crate::ObjectHandle;
use crate::ObjectListener;

fn actor_class(objects: &ObjectArray) -> Arc<Class> {
    objects
        .register_class(
            Class::builder("Actor")
                .path("/Script/Engine.Actor")
                .method("ReceiveBeginPlay", |_| Ok(()))
                .method("ReceiveTick", |_| Ok(())),
        )
        .unwrap()
}

/// Records every event it receives as a string.
#[derive(Default)]
struct RecordingListener {
    events: Mutex<Vec<String>>,
}

impl RecordingListener {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ObjectListener for RecordingListener {
    fn on_object_created(&self, object: &Arc<Object>) {
        self.events.lock().unwrap().push(format!("created {}", object.name()));
    }

    fn on_object_destroyed(&self, object: &Arc<Object>) {
        self.events.lock().unwrap().push(format!("destroyed {}", object.name()));
    }

    fn on_class_unloaded(&self, class: &Arc<Class>) {
        self.events.lock().unwrap().push(format!("unloaded {}", class.name()));
    }

    fn on_array_shutdown(&self) {
        self.events.lock().unwrap().push("shutdown".to_string());
    }
}

// --- Classes ---

#[test]
fn test_register_class_defaults_path_to_name() {
    let objects = ObjectArray::new();
    let class = objects.register_class(Class::builder("AC_Input_C")).unwrap();

    assert_eq!(class.path(), "AC_Input_C");
    assert_eq!(objects.find_class("AC_Input_C").unwrap().id(), class.id());
}

#[test]
fn test_register_class_rejects_duplicate_path() {
    let objects = ObjectArray::new();
    actor_class(&objects);

    let err = objects
        .register_class(Class::builder("Other").path("/Script/Engine.Actor"))
        .unwrap_err();
    assert_eq!(err, Error::DuplicateClassPath("/Script/Engine.Actor".into()));
}

#[test]
fn test_register_class_rejects_duplicate_method() {
    let objects = ObjectArray::new();
    let err = objects
        .register_class(
            Class::builder("Pawn")
                .method("Jump", |_| Ok(()))
                .method("Jump", |_| Ok(())),
        )
        .unwrap_err();

    assert_eq!(err, Error::DuplicateMethod { class: "Pawn".into(), method: "Jump".into() });
    // nothing was registered
    assert!(objects.find_class("Pawn").is_err());
}

#[test]
fn test_register_class_rejects_empty_method_name() {
    let objects = ObjectArray::new();
    let err = objects
        .register_class(Class::builder("Pawn").method("", |_| Ok(())))
        .unwrap_err();
    assert_eq!(err, Error::InvalidMethodName { class: "Pawn".into() });
}

#[test]
fn test_register_class_rejects_foreign_parent() {
    let other = ObjectArray::new();
    let foreign = actor_class(&other);

    let objects = ObjectArray::new();
    let err = objects
        .register_class(Class::builder("Pawn").parent(&foreign))
        .unwrap_err();
    assert_eq!(err, Error::ParentNotRegistered("Actor".into()));
}

#[test]
fn test_class_chain_lookup() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    let character = objects
        .register_class(
            Class::builder("BP_MainCharacter_C")
                .parent(&actor)
                .implements("PuertsMixinInterface")
                .property("MixinModulePath", "Project/Blueprints/Character/BP_MainCharacter")
                .method("Jump", |_| Ok(())),
        )
        .unwrap();

    assert!(character.is_child_of(&actor));
    assert!(!actor.is_child_of(&character));
    assert!(character.find_method("ReceiveBeginPlay").is_some());
    assert!(character.find_method("Jump").is_some());
    assert!(actor.find_method("Jump").is_none());
    assert!(character.own_methods().get("ReceiveBeginPlay").is_none());
    assert!(character.implements("PuertsMixinInterface"));
    assert_eq!(
        character.property("MixinModulePath"),
        Some("Project/Blueprints/Character/BP_MainCharacter")
    );
    assert_eq!(character.ancestors().count(), 2);
}

#[test]
fn test_interfaces_and_properties_are_inherited() {
    let objects = ObjectArray::new();
    let base = objects
        .register_class(
            Class::builder("Base")
                .implements("Mixable")
                .property("Module", "base"),
        )
        .unwrap();
    let derived = objects
        .register_class(Class::builder("Derived").parent(&base))
        .unwrap();

    assert!(derived.implements("Mixable"));
    assert_eq!(derived.property("Module"), Some("base"));
    assert_eq!(derived.property("Missing"), None);

    assert_eq!(derived.property_owner("Module").map(|c| c.id()), Some(base.id()));
    assert_eq!(base.property_owner("Module").map(|c| c.id()), Some(base.id()));
    assert!(derived.property_owner("Missing").is_none());
}

// --- Objects ---

#[test]
fn test_spawn_and_resolve() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);

    let handle = objects.spawn(actor.id(), "Actor_0").unwrap();
    let object = objects.resolve(handle).expect("object should resolve");

    assert_eq!(object.handle(), handle);
    assert_eq!(object.name(), "Actor_0");
    assert_eq!(object.class().id(), actor.id());
    assert_eq!(objects.len(), 1);
}

#[test]
fn test_spawn_unknown_class_fails() {
    let objects = ObjectArray::new();
    let err = objects.spawn(crate::ClassId(42), "Ghost").unwrap_err();
    assert_eq!(err, Error::ClassNotFound(crate::ClassId(42)));
    assert!(matches!(
        objects.spawn_by_path("/Game/Missing", "Ghost"),
        Err(Error::ClassPathNotFound(_))
    ));
}

#[test]
fn test_null_handle_never_resolves() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    objects.spawn(actor.id(), "Actor_0").unwrap();

    assert!(ObjectHandle::NONE.is_none());
    assert!(objects.resolve(ObjectHandle::NONE).is_none());
    assert_eq!(ObjectHandle::default(), ObjectHandle::NONE);
}

#[test]
fn test_destroyed_handle_stops_resolving() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    let handle = objects.spawn(actor.id(), "Actor_0").unwrap();

    objects.destroy(handle).unwrap();

    assert!(!objects.is_valid(handle));
    assert_eq!(objects.destroy(handle), Err(Error::ObjectNotFound(handle)));
}

#[test]
fn test_stale_handle_does_not_alias_reused_slot() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);

    let old = objects.spawn(actor.id(), "Old").unwrap();
    objects.destroy(old).unwrap();
    let new = objects.spawn(actor.id(), "New").unwrap();

    assert_eq!(old.index, new.index, "slot should be recycled");
    assert_ne!(old.serial, new.serial);
    assert!(objects.resolve(old).is_none());
    assert_eq!(objects.resolve(new).unwrap().name(), "New");
    // destroying through the stale handle must not touch the new object
    assert!(objects.destroy(old).is_err());
    assert!(objects.is_valid(new));
}

#[test]
fn test_serials_are_never_reused_after_exhaustion() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    objects.set_next_serial(u32::MAX - 1);

    let last = objects.spawn(actor.id(), "Last").unwrap();
    assert_eq!(last.serial, u32::MAX - 1);

    objects.destroy(last).unwrap();
    assert_eq!(objects.spawn(actor.id(), "Wrapped"), Err(Error::SerialsExhausted));
    assert!(objects.is_empty());
    assert!(!objects.is_valid(last));
}

#[test]
fn test_resolved_object_outlives_destroy() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    let handle = objects.spawn(actor.id(), "Actor_0").unwrap();

    let held = objects.resolve(handle).unwrap();
    objects.destroy(handle).unwrap();

    assert_eq!(held.name(), "Actor_0");
    assert!(objects.resolve(handle).is_none());
}

#[test]
fn test_objects_of_class() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    let input = objects.register_class(Class::builder("AC_Input_C")).unwrap();

    let a = objects.spawn(actor.id(), "A").unwrap();
    let b = objects.spawn(actor.id(), "B").unwrap();
    objects.spawn(input.id(), "Input").unwrap();

    let mut found = objects.objects_of_class(actor.id());
    found.sort_by_key(|handle| handle.serial);
    assert_eq!(found, vec![a, b]);
}

#[test]
fn test_user_data() {
    #[derive(Debug, PartialEq)]
    struct Health(u32);

    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    let object = objects.resolve(objects.spawn(actor.id(), "A").unwrap()).unwrap();

    assert!(!object.has_data::<Health>());
    assert_eq!(object.with_data(|health: &mut Health| health.0), None);

    object.insert_data(Health(100));
    object.with_data(|health: &mut Health| health.0 -= 30);

    assert_eq!(object.with_data(|health: &mut Health| health.0), Some(70));
    assert_eq!(object.remove_data::<Health>(), Some(Health(70)));
    assert!(!object.has_data::<Health>());
}

// --- Unloading ---

#[test]
fn test_unload_class_requires_no_instances() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    let handle = objects.spawn(actor.id(), "A").unwrap();

    assert_eq!(objects.unload_class(actor.id()), Err(Error::ClassInUse(actor.id())));

    objects.destroy(handle).unwrap();
    objects.unload_class(actor.id()).unwrap();

    assert!(objects.get_class(actor.id()).is_err());
    assert!(objects.find_class("/Script/Engine.Actor").is_err());
}

#[test]
fn test_unload_class_requires_no_subclasses() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    let pawn = objects.register_class(Class::builder("Pawn").parent(&actor)).unwrap();

    assert_eq!(objects.unload_class(actor.id()), Err(Error::ClassInUse(actor.id())));
    objects.unload_class(pawn.id()).unwrap();
    objects.unload_class(actor.id()).unwrap();
}

// --- Listeners ---

#[test]
fn test_listener_sees_lifecycle_events() {
    let objects = ObjectArray::new();
    let recorder = Arc::new(RecordingListener::default());
    objects.add_listener(recorder.clone());

    let actor = actor_class(&objects);
    let handle = objects.spawn(actor.id(), "A").unwrap();
    objects.destroy(handle).unwrap();
    objects.unload_class(actor.id()).unwrap();
    objects.shutdown();

    assert_eq!(
        recorder.events(),
        vec!["created A", "destroyed A", "unloaded Actor", "shutdown"]
    );
}

#[test]
fn test_removed_listener_is_silent() {
    let objects = ObjectArray::new();
    let recorder = Arc::new(RecordingListener::default());
    let id = objects.add_listener(recorder.clone());

    assert!(objects.remove_listener(id));
    assert!(!objects.remove_listener(id));

    let actor = actor_class(&objects);
    objects.spawn(actor.id(), "A").unwrap();
    assert!(recorder.events().is_empty());
}

/// Destroys every object it is told about, from inside the notification.
struct Reaper {
    objects: Weak<ObjectArray>,
    reaped: AtomicUsize,
}

impl ObjectListener for Reaper {
    fn on_object_created(&self, object: &Arc<Object>) {
        if let Some(objects) = self.objects.upgrade() {
            objects.destroy(object.handle()).unwrap();
            self.reaped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[test]
fn test_listener_may_reenter_array() {
    let objects = Arc::new(ObjectArray::new());
    let reaper = Arc::new(Reaper {
        objects: Arc::downgrade(&objects),
        reaped: AtomicUsize::new(0),
    });
    objects.add_listener(reaper.clone());

    let actor = actor_class(&objects);
    let handle = objects.spawn(actor.id(), "Doomed").unwrap();

    assert_eq!(reaper.reaped.load(Ordering::SeqCst), 1);
    assert!(!objects.is_valid(handle));
}

// --- Shutdown ---

#[test]
fn test_shutdown_rejects_new_work() {
    let objects = ObjectArray::new();
    let actor = actor_class(&objects);
    let handle = objects.spawn(actor.id(), "A").unwrap();

    objects.shutdown();
    objects.shutdown();

    assert!(objects.is_shut_down());
    assert!(objects.resolve(handle).is_none());
    assert!(objects.is_empty());
    assert_eq!(objects.spawn(actor.id(), "B"), Err(Error::Shutdown));
    assert_eq!(objects.register_class(Class::builder("Late")).unwrap_err(), Error::Shutdown);
}
