//! Runtime execution tracing infrastructure.
//!
//! Provides a trait-based tracing system for the runtime core. All hooks have
//! default no-op bodies, so [`NoopTracer`] requires zero lines of code and the
//! hooks vanish in production use. Concrete implementations collect different
//! kinds of data:
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | No-op (production default) |
//! | [`StderrTracer`] | Human-readable execution log to stderr |
//! | [`RecordingTracer`] | Full event recording for tests and post-mortem |
//!
//! The [`ExecutionContext`](crate::context::ExecutionContext) and the
//! [`RefCountManager`](crate::refcount::RefCountManager) both carry a shared
//! tracer handle. Notably, destructor-callback failures — which the refcount
//! manager swallows rather than propagating into unrelated scopes — are
//! reported through [`RuntimeTracer::on_destructor_error`], making the tracer
//! the only place those failures are observable.

use std::{cell::RefCell, rc::Rc};

/// Trace event emitted during runtime execution.
///
/// Used by [`RecordingTracer`] to capture an execution trace for assertions
/// in tests or post-mortem analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A call frame was pushed.
    FramePush {
        /// Name of the entered function.
        function: String,
        /// Call stack depth after the push.
        depth: usize,
    },
    /// A call frame was popped.
    FramePop {
        /// Call stack depth after the pop.
        depth: usize,
    },
    /// An exception was stored into the execution context.
    ExceptionSet {
        /// Exception class name, if any.
        class: Option<String>,
        /// Exception message.
        message: String,
    },
    /// The exception slot was cleared (handled or consumed).
    ExceptionCleared,
    /// An object's refcount reached zero and its destructor ran.
    ObjectDestroyed {
        /// Class name of the destroyed object.
        class: String,
    },
    /// A destructor callback returned an error that was swallowed.
    DestructorError {
        /// Class name of the object whose destructor failed.
        class: String,
        /// Display form of the swallowed error.
        error: String,
    },
    /// A method was registered with the method registry.
    MethodRegistered {
        /// Method name as declared.
        name: String,
        /// The dense id assigned by the registry.
        id: u32,
    },
}

/// Trait for runtime execution tracing.
///
/// All methods have default no-op implementations; implementations only
/// override the hooks they care about.
pub trait RuntimeTracer: std::fmt::Debug {
    /// Called when a call frame is pushed.
    #[inline]
    fn on_frame_push(&mut self, _function: &str, _depth: usize) {}

    /// Called when a call frame is popped.
    #[inline]
    fn on_frame_pop(&mut self, _depth: usize) {}

    /// Called when an exception is stored into the execution context.
    #[inline]
    fn on_exception_set(&mut self, _class: Option<&str>, _message: &str) {}

    /// Called when the active exception slot is cleared.
    #[inline]
    fn on_exception_cleared(&mut self) {}

    /// Called after an object's destructor callback ran to completion.
    #[inline]
    fn on_object_destroyed(&mut self, _class: &str) {}

    /// Called when a destructor callback fails.
    ///
    /// Destructor errors never propagate (destruction must not fail upward);
    /// this hook is where they become visible.
    #[inline]
    fn on_destructor_error(&mut self, _class: &str, _error: &str) {}

    /// Called when a method is registered with the registry.
    #[inline]
    fn on_method_registered(&mut self, _name: &str, _id: u32) {}
}

/// Shared handle to a tracer, cloneable across the context and the refcount
/// manager.
pub type TracerRef = Rc<RefCell<dyn RuntimeTracer>>;

/// Wraps a tracer into the shared handle form.
pub fn shared_tracer<T: RuntimeTracer + 'static>(tracer: T) -> TracerRef {
    Rc::new(RefCell::new(tracer))
}

// ============================================================================
// NoopTracer — production default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl RuntimeTracer for NoopTracer {}

// ============================================================================
// StderrTracer — human-readable execution log
// ============================================================================

/// Tracer that prints a human-readable execution log to stderr.
///
/// Output format:
/// ```text
///   >>> CALL Fibonacci       depth=2
///   <<< RETURN               depth=1
///   !!! EXCEPTION ERangeError: value out of range
///   ~~~ DESTROY TResource
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrTracer;

impl RuntimeTracer for StderrTracer {
    fn on_frame_push(&mut self, function: &str, depth: usize) {
        eprintln!("  >>> CALL {function:<20} depth={depth}");
    }

    fn on_frame_pop(&mut self, depth: usize) {
        eprintln!("  <<< RETURN{:<20} depth={depth}", "");
    }

    fn on_exception_set(&mut self, class: Option<&str>, message: &str) {
        eprintln!("  !!! EXCEPTION {}: {message}", class.unwrap_or("Exception"));
    }

    fn on_object_destroyed(&mut self, class: &str) {
        eprintln!("  ~~~ DESTROY {class}");
    }

    fn on_destructor_error(&mut self, class: &str, error: &str) {
        eprintln!("  ~~~ DESTROY {class} failed (swallowed): {error}");
    }
}

// ============================================================================
// RecordingTracer — event capture for tests
// ============================================================================

/// Tracer that records every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Vec<TraceEvent>,
}

impl RecordingTracer {
    /// Creates an empty recording tracer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// Returns how many events of the given shape were recorded.
    pub fn count(&self, matches: impl Fn(&TraceEvent) -> bool) -> usize {
        self.events.iter().filter(|e| matches(e)).count()
    }

    /// Clears the recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl RuntimeTracer for RecordingTracer {
    fn on_frame_push(&mut self, function: &str, depth: usize) {
        self.events.push(TraceEvent::FramePush {
            function: function.to_string(),
            depth,
        });
    }

    fn on_frame_pop(&mut self, depth: usize) {
        self.events.push(TraceEvent::FramePop { depth });
    }

    fn on_exception_set(&mut self, class: Option<&str>, message: &str) {
        self.events.push(TraceEvent::ExceptionSet {
            class: class.map(str::to_string),
            message: message.to_string(),
        });
    }

    fn on_exception_cleared(&mut self) {
        self.events.push(TraceEvent::ExceptionCleared);
    }

    fn on_object_destroyed(&mut self, class: &str) {
        self.events.push(TraceEvent::ObjectDestroyed {
            class: class.to_string(),
        });
    }

    fn on_destructor_error(&mut self, class: &str, error: &str) {
        self.events.push(TraceEvent::DestructorError {
            class: class.to_string(),
            error: error.to_string(),
        });
    }

    fn on_method_registered(&mut self, name: &str, id: u32) {
        self.events.push(TraceEvent::MethodRegistered {
            name: name.to_string(),
            id,
        });
    }
}
