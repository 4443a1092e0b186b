//! Reference counting and destructor invocation.
//!
//! Walks the canonical binding scenario — assign to A, copy to B, nil A,
//! nil B — and verifies the destructor fires exactly once, at the moment
//! the last binding is released, with `Destroyed` set before the body runs.

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use pascalet::{
    ClassMetadata, ObjectInstance, ObjectRef, RecordingTracer, RefCountManager, RunError, TraceEvent, TracerRef,
    Value,
};

fn manager_with_counter() -> (RefCountManager, Rc<Cell<u32>>) {
    let manager = RefCountManager::new();
    let fired = Rc::new(Cell::new(0));
    let fired_in_callback = fired.clone();
    manager.set_destructor_callback(Rc::new(move |obj: &ObjectRef| {
        let mut instance = obj.borrow_mut();
        if instance.destroyed() {
            return Ok(());
        }
        instance.mark_destroyed();
        fired_in_callback.set(fired_in_callback.get() + 1);
        Ok(())
    }));
    (manager, fired)
}

fn new_object(class_name: &str) -> Value {
    let class = ClassMetadata::new_ref(class_name);
    Value::Object(ObjectInstance::new(&class, None))
}

// =============================================================================
// 1. The canonical A/B binding walk
// =============================================================================

/// Create; bind to A (1); bind A to B (2); A := nil (1); B := nil (0 =>
/// destructor fires once, Destroyed = true).
#[test]
fn two_bindings_one_destruction() {
    let (manager, fired) = manager_with_counter();
    let value = new_object("TThing");

    assert_eq!(manager.increment_ref(&value), Some(1), "bound to A");
    assert_eq!(manager.increment_ref(&value), Some(2), "A copied into B");
    assert_eq!(manager.decrement_ref(&value), Some(1), "A := nil");
    assert_eq!(fired.get(), 0, "destructor must not fire while B is live");
    assert_eq!(manager.decrement_ref(&value), Some(0), "B := nil");
    assert_eq!(fired.get(), 1, "destructor fires exactly once");

    let Value::Object(obj) = &value else { unreachable!() };
    assert!(obj.borrow().destroyed());
    assert_eq!(obj.borrow().ref_count(), 0);
}

// =============================================================================
// 2. Balanced increments and decrements
// =============================================================================

/// After N increments and N decrements the count is 0 and the destructor
/// ran exactly once, for any N.
#[test]
fn n_up_n_down_destroys_once() {
    for n in 1..=8 {
        let (manager, fired) = manager_with_counter();
        let value = new_object("TThing");
        for _ in 0..n {
            manager.increment_ref(&value);
        }
        for _ in 0..n {
            manager.decrement_ref(&value);
        }
        assert_eq!(fired.get(), 1, "n = {n}");
        let Value::Object(obj) = &value else { unreachable!() };
        assert_eq!(obj.borrow().ref_count(), 0, "n = {n}");
    }
}

/// Decrementing a never-bound object clamps at zero and never fires.
#[test]
fn decrement_clamps_at_zero() {
    let (manager, fired) = manager_with_counter();
    let value = new_object("TThing");
    assert_eq!(manager.decrement_ref(&value), Some(0));
    assert_eq!(manager.decrement_ref(&value), Some(0));
    assert_eq!(fired.get(), 0, "an object that was never live must not be destroyed");
}

// =============================================================================
// 3. Interfaces wrap and release the underlying object
// =============================================================================

/// Wrapping in an interface keeps the object alive after the direct
/// binding is dropped; releasing the interface destroys it.
#[test]
fn interface_wrap_extends_lifetime() {
    let (manager, fired) = manager_with_counter();
    let class = ClassMetadata::new_ref("TImpl");
    let obj = ObjectInstance::new(&class, None);
    let direct = Value::Object(obj.clone());

    manager.increment_ref(&direct);
    let iface = Rc::new(pascalet::InterfaceInfo::new("IThing"));
    let wrapped = manager.wrap_in_interface(iface, &obj);
    assert_eq!(obj.borrow().ref_count(), 2);

    manager.decrement_ref(&direct);
    assert_eq!(fired.get(), 0, "interface still holds the object");
    manager.decrement_ref(&wrapped);
    assert_eq!(fired.get(), 1);
}

// =============================================================================
// 4. Destructor failures are contained
// =============================================================================

/// A failing destructor is swallowed; the error surfaces only through the
/// tracer.
#[test]
fn destructor_errors_go_to_the_tracer() {
    let manager = RefCountManager::new();
    manager.set_destructor_callback(Rc::new(|obj: &ObjectRef| {
        obj.borrow_mut().mark_destroyed();
        Err(RunError::type_error("destructor exploded"))
    }));
    let recorder = Rc::new(RefCell::new(RecordingTracer::new()));
    manager.set_tracer(recorder.clone() as TracerRef);

    let value = new_object("TFragile");
    manager.increment_ref(&value);
    manager.decrement_ref(&value);

    let recorder = recorder.borrow();
    let events: Vec<TraceEvent> = recorder
        .events()
        .iter()
        .filter(|e| matches!(e, TraceEvent::DestructorError { .. }))
        .cloned()
        .collect();
    assert_eq!(events.len(), 1, "exactly one swallowed error reported: {events:?}");
    if let TraceEvent::DestructorError { class, error } = &events[0] {
        assert_eq!(class, "TFragile");
        assert!(error.contains("destructor exploded"), "got {error}");
    }
}
