//! Reference counting with destructor callbacks.
//!
//! Objects start at refcount 0 and are incremented on every binding
//! (variable assignment, interface wrap, method-pointer capture, return)
//! and decremented on rebinding and scope exit. When a live object drops to
//! 0 the destructor callback fires exactly once.
//!
//! The callback is installed by the evaluator at bootstrap — this is the
//! seam that keeps the runtime from depending on statement execution. Its
//! contract: check `destroyed`, set it *before* running the destructor body
//! (nested `Destroy` calls in inherited chains are tracked through the
//! instance's destroy-call depth), and leave the refcount at 0. Errors the
//! callback returns are swallowed here and surfaced only through the
//! tracer — destruction must never fail upward into unrelated scopes.
//!
//! Thread safety: only the callback pointer is guarded (callbacks can be
//! swapped between runs); the refcount fields themselves are mutated from
//! the single evaluator thread.

use std::{rc::Rc, sync::Mutex};

use crate::{
    error::RunResult,
    object::ObjectRef,
    tracer::TracerRef,
    value::Value,
};

/// The destructor action installed by the evaluator. Shared (`Rc`) so the
/// callback slot's lock is released before the callback runs — a destructor
/// body releasing other objects re-enters [`RefCountManager::decrement_ref`].
pub type DestructorFn = Rc<dyn Fn(&ObjectRef) -> RunResult<()>>;

/// Manages object refcounts and the destructor callback.
#[derive(Default)]
pub struct RefCountManager {
    destructor: Mutex<Option<DestructorFn>>,
    tracer: Mutex<Option<TracerRef>>,
}

impl std::fmt::Debug for RefCountManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let installed = self.destructor.lock().map(|g| g.is_some()).unwrap_or(false);
        f.debug_struct("RefCountManager")
            .field("destructor_installed", &installed)
            .finish_non_exhaustive()
    }
}

impl RefCountManager {
    /// Creates a manager with no destructor callback installed (objects
    /// then simply drop to refcount 0 without running user code).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs or replaces the destructor callback.
    pub fn set_destructor_callback(&self, callback: DestructorFn) {
        *self.destructor.lock().expect("destructor slot poisoned") = Some(callback);
    }

    /// Removes the destructor callback.
    pub fn clear_destructor_callback(&self) {
        *self.destructor.lock().expect("destructor slot poisoned") = None;
    }

    /// Installs a tracer used to report swallowed destructor errors and
    /// completed destructions.
    pub fn set_tracer(&self, tracer: TracerRef) {
        *self.tracer.lock().expect("tracer slot poisoned") = Some(tracer);
    }

    /// The object beneath a value, for Object and Interface values.
    fn underlying(value: &Value) -> Option<ObjectRef> {
        match value {
            Value::Object(obj) => Some(obj.clone()),
            Value::Interface(iface) => Some(iface.object().clone()),
            _ => None,
        }
    }

    /// Increments the refcount of an Object (or the object beneath an
    /// Interface). A no-op on everything else. Returns the new count when
    /// the value was refcounted.
    pub fn increment_ref(&self, value: &Value) -> Option<usize> {
        let obj = Self::underlying(value)?;
        let count = obj.borrow_mut().inc_ref();
        Some(count)
    }

    /// Decrements the refcount, clamping at 0. When a live object drops to
    /// 0 the destructor callback fires exactly once; its errors are
    /// swallowed (reported to the tracer). Returns the new count when the
    /// value was refcounted.
    pub fn decrement_ref(&self, value: &Value) -> Option<usize> {
        let obj = Self::underlying(value)?;
        let (count, fire) = {
            let mut instance = obj.borrow_mut();
            if instance.ref_count() == 0 {
                (0, false)
            } else {
                let count = instance.dec_ref();
                (count, count == 0 && !instance.destroyed())
            }
        };
        if fire {
            self.run_destructor(&obj);
        }
        Some(count)
    }

    /// Wraps an object in an interface view, incrementing the object.
    #[must_use]
    pub fn wrap_in_interface(&self, iface: crate::meta::InterfaceRef, object: &ObjectRef) -> Value {
        object.borrow_mut().inc_ref();
        Value::Interface(std::rc::Rc::new(crate::object::InterfaceInstance::new(
            iface,
            object.clone(),
        )))
    }

    /// Runs the destructor callback for an object that reached refcount 0.
    /// Both the instance borrow and the callback-slot lock are released
    /// before the callback runs, so the destructor body can touch the
    /// object and release further objects freely.
    fn run_destructor(&self, object: &ObjectRef) {
        let class_name = object.borrow().class_name();
        let callback = self.destructor.lock().expect("destructor slot poisoned").clone();
        let Some(callback) = callback else { return };
        let result = callback(object);
        let tracer = self.tracer.lock().expect("tracer slot poisoned").clone();
        match result {
            Ok(()) => {
                if let Some(tracer) = tracer {
                    tracer.borrow_mut().on_object_destroyed(&class_name);
                }
            }
            Err(err) => {
                if let Some(tracer) = tracer {
                    tracer.borrow_mut().on_destructor_error(&class_name, &err.to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::meta::ClassMetadata;
    use crate::object::ObjectInstance;

    fn new_object() -> ObjectRef {
        let class = ClassMetadata::new_ref("TThing");
        ObjectInstance::new(&class, None)
    }

    #[test]
    fn increment_is_a_noop_on_non_objects() {
        let manager = RefCountManager::new();
        assert_eq!(manager.increment_ref(&Value::Int(1)), None);
        assert_eq!(manager.decrement_ref(&Value::string("x")), None);
    }

    #[test]
    fn n_increments_then_n_decrements_fire_once() {
        let manager = RefCountManager::new();
        let fired = Rc::new(Cell::new(0));
        let fired_in_callback = fired.clone();
        manager.set_destructor_callback(Rc::new(move |obj: &ObjectRef| {
            let mut instance = obj.borrow_mut();
            assert!(!instance.destroyed());
            instance.mark_destroyed();
            fired_in_callback.set(fired_in_callback.get() + 1);
            Ok(())
        }));

        let value = Value::Object(new_object());
        for expected in 1..=3 {
            assert_eq!(manager.increment_ref(&value), Some(expected));
        }
        for expected in (0..=2).rev() {
            assert_eq!(manager.decrement_ref(&value), Some(expected));
        }
        assert_eq!(fired.get(), 1, "destructor must fire exactly once");
        // Further decrements clamp at zero without re-firing.
        assert_eq!(manager.decrement_ref(&value), Some(0));
        assert_eq!(fired.get(), 1);
        if let Value::Object(obj) = &value {
            assert!(obj.borrow().destroyed());
            assert_eq!(obj.borrow().ref_count(), 0);
        }
    }

    #[test]
    fn destructor_errors_are_swallowed() {
        let manager = RefCountManager::new();
        manager.set_destructor_callback(Rc::new(|obj: &ObjectRef| {
            obj.borrow_mut().mark_destroyed();
            Err(crate::error::RunError::type_error("destructor exploded"))
        }));
        let value = Value::Object(new_object());
        manager.increment_ref(&value);
        // Must not panic or propagate.
        assert_eq!(manager.decrement_ref(&value), Some(0));
    }

    #[test]
    fn interface_wrap_increments_the_object() {
        let manager = RefCountManager::new();
        let obj = new_object();
        let iface = Rc::new(crate::meta::InterfaceInfo::new("IThing"));
        let wrapped = manager.wrap_in_interface(iface, &obj);
        assert_eq!(obj.borrow().ref_count(), 1);
        // Releasing the interface view decrements the underlying object.
        assert_eq!(manager.decrement_ref(&wrapped), Some(0));
        assert_eq!(obj.borrow().ref_count(), 0);
    }
}
