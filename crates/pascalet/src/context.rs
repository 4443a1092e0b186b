//! The execution context.
//!
//! One evaluator owns one `ExecutionContext` and drives it sequentially: it
//! pushes and pops environments and call frames, raises and samples
//! exceptions, and signals structured jumps through the control-flow slot.
//!
//! Control flow is a single-slot enum, not an unwinding exception — Break
//! and Continue are loop-scoped and swallowed at the loop boundary, Exit
//! and Return propagate to the enclosing function frame, and exceptions
//! travel in their own channel until a matching handler. Only one signal is
//! active at a time.

use std::{cell::Cell, cell::RefCell, rc::Rc};

use ahash::AHashMap;
use strum::Display;

use crate::{
    callstack::{CallStack, StackFrame},
    env::{EnvRef, Environment},
    error::RunResult,
    exception::ExceptionRef,
    limits::RuntimeLimits,
    refcount::RefCountManager,
    tracer::{NoopTracer, TracerRef, shared_tracer},
    types::{ArrayType, RecordType},
    value::Value,
};

/// Structured-jump signal. `None` is the quiescent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ControlFlow {
    #[default]
    None,
    Break,
    Continue,
    Exit,
    Return,
}

/// Callback reading the mirrored exception state from an external
/// subsystem (e.g. a language-level "current exception" global).
pub type ExceptionGetter = Rc<dyn Fn() -> Option<ExceptionRef>>;

/// Callback mirroring exception-state changes into an external subsystem.
pub type ExceptionSetter = Rc<dyn Fn(Option<ExceptionRef>)>;

/// The state one evaluator threads through statement execution.
pub struct ExecutionContext {
    /// Current innermost environment.
    env: EnvRef,
    /// Environments suspended by `push_env`, outermost first.
    env_stack: Vec<EnvRef>,
    /// Shared call stack (clones of this context share it).
    call_stack: Rc<RefCell<CallStack>>,
    /// Shared control-flow slot.
    control: Rc<Cell<ControlFlow>>,
    /// The active exception.
    exception: Option<ExceptionRef>,
    /// The exception currently being handled in an except-clause, kept
    /// distinct from the active one so a bare `raise;` can re-raise it.
    handler_exception: Option<ExceptionRef>,
    exception_getter: Option<ExceptionGetter>,
    exception_setter: Option<ExceptionSetter>,
    /// Contextual typing slot for record literals with elided types.
    record_context: Option<Rc<RecordType>>,
    /// Contextual typing slot for array literals with elided types.
    array_context: Option<Rc<ArrayType>>,
    /// `old(expr)` capture stack for post-condition introspection, one map
    /// per active contract frame.
    old_values: Vec<AHashMap<String, Value>>,
    /// The refcount manager objects in this context are counted by.
    refcount: Rc<RefCountManager>,
    tracer: TracerRef,
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("env_depth", &(self.env_stack.len() + 1))
            .field("call_depth", &self.call_stack.borrow().depth())
            .field("control", &self.control.get())
            .field("has_exception", &self.exception.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext {
    /// Creates a context with default limits, a fresh refcount manager,
    /// and no tracing.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(
            &RuntimeLimits::default(),
            Rc::new(RefCountManager::new()),
            shared_tracer(NoopTracer),
        )
    }

    /// Creates a context over an existing refcount manager and tracer.
    #[must_use]
    pub fn with_parts(limits: &RuntimeLimits, refcount: Rc<RefCountManager>, tracer: TracerRef) -> Self {
        Self {
            env: Environment::new(),
            env_stack: Vec::new(),
            call_stack: Rc::new(RefCell::new(CallStack::with_limits(limits))),
            control: Rc::new(Cell::new(ControlFlow::None)),
            exception: None,
            handler_exception: None,
            exception_getter: None,
            exception_setter: None,
            record_context: None,
            array_context: None,
            old_values: Vec::new(),
            refcount,
            tracer,
        }
    }

    /// Installs the optional exception mirror callbacks.
    pub fn set_exception_callbacks(&mut self, getter: ExceptionGetter, setter: ExceptionSetter) {
        self.exception_getter = Some(getter);
        self.exception_setter = Some(setter);
    }

    // ------------------------------------------------------------------
    // Environments
    // ------------------------------------------------------------------

    /// The current innermost environment.
    #[must_use]
    pub fn env(&self) -> &EnvRef {
        &self.env
    }

    /// Enters a child scope.
    pub fn push_env(&mut self) {
        let child = Environment::new_enclosed(&self.env);
        self.env_stack.push(std::mem::replace(&mut self.env, child));
    }

    /// Leaves the current scope, restoring the suspended one. A pop with
    /// no suspended scope keeps the current environment.
    pub fn pop_env(&mut self) {
        if let Some(outer) = self.env_stack.pop() {
            self.env = outer;
        }
    }

    /// How many scopes are active (the current one included).
    #[must_use]
    pub fn env_depth(&self) -> usize {
        self.env_stack.len() + 1
    }

    // ------------------------------------------------------------------
    // Call stack
    // ------------------------------------------------------------------

    /// The shared call stack handle.
    #[must_use]
    pub fn call_stack(&self) -> &Rc<RefCell<CallStack>> {
        &self.call_stack
    }

    /// Pushes a call frame, refusing at the depth limit.
    pub fn push_frame(&mut self, frame: StackFrame) -> RunResult<()> {
        let function = frame.function.clone();
        self.call_stack.borrow_mut().push(frame)?;
        let depth = self.call_stack.borrow().depth();
        self.tracer.borrow_mut().on_frame_push(&function, depth);
        Ok(())
    }

    /// Pops the innermost call frame.
    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        let frame = self.call_stack.borrow_mut().pop();
        if frame.is_some() {
            let depth = self.call_stack.borrow().depth();
            self.tracer.borrow_mut().on_frame_pop(depth);
        }
        frame
    }

    /// Snapshots the call stack for a raise.
    #[must_use]
    pub fn stack_snapshot(&self) -> Vec<StackFrame> {
        self.call_stack.borrow().snapshot()
    }

    // ------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------

    /// The active control-flow signal.
    #[must_use]
    pub fn control(&self) -> ControlFlow {
        self.control.get()
    }

    /// Sets the control-flow signal (replacing any previous one — only one
    /// signal is active at a time).
    pub fn set_control(&self, signal: ControlFlow) {
        self.control.set(signal);
    }

    /// Clears the signal back to quiescent.
    pub fn clear_control(&self) {
        self.control.set(ControlFlow::None);
    }

    /// Returns `true` while any signal is active.
    #[must_use]
    pub fn signal_active(&self) -> bool {
        self.control.get() != ControlFlow::None
    }

    // ------------------------------------------------------------------
    // Exception channel
    // ------------------------------------------------------------------

    /// The active exception. When a mirror getter is installed it is
    /// authoritative (the external subsystem may have changed the state).
    #[must_use]
    pub fn exception(&self) -> Option<ExceptionRef> {
        match &self.exception_getter {
            Some(getter) => getter(),
            None => self.exception.clone(),
        }
    }

    /// Raises: stores the exception and mirrors the change.
    pub fn set_exception(&mut self, exception: ExceptionRef) {
        self.tracer.borrow_mut().on_exception_set(
            exception.class.as_ref().map(|c| c.borrow().name.clone()).as_deref(),
            &exception.message,
        );
        if let Some(setter) = &self.exception_setter {
            setter(Some(exception.clone()));
        }
        self.exception = Some(exception);
    }

    /// Clears the active exception (handled), mirroring the change.
    pub fn clear_exception(&mut self) {
        if self.exception.is_some() {
            self.tracer.borrow_mut().on_exception_cleared();
        }
        if let Some(setter) = &self.exception_setter {
            setter(None);
        }
        self.exception = None;
    }

    /// Takes the active exception out of the slot, mirroring the change.
    pub fn take_exception(&mut self) -> Option<ExceptionRef> {
        let taken = self.exception.take();
        if taken.is_some() {
            self.tracer.borrow_mut().on_exception_cleared();
            if let Some(setter) = &self.exception_setter {
                setter(None);
            }
        }
        taken
    }

    /// The exception being handled by the innermost except-clause.
    #[must_use]
    pub fn handler_exception(&self) -> Option<ExceptionRef> {
        self.handler_exception.clone()
    }

    /// Enters an except-clause: remembers the exception for `raise;`.
    pub fn set_handler_exception(&mut self, exception: ExceptionRef) {
        self.handler_exception = Some(exception);
    }

    /// Leaves the except-clause.
    pub fn clear_handler_exception(&mut self) {
        self.handler_exception = None;
    }

    // ------------------------------------------------------------------
    // Contextual typing slots
    // ------------------------------------------------------------------

    /// Sets the record type a typeless record literal should assume.
    pub fn set_record_context(&mut self, record_type: Rc<RecordType>) {
        self.record_context = Some(record_type);
    }

    /// The contextual record type, if set.
    #[must_use]
    pub fn record_context(&self) -> Option<&Rc<RecordType>> {
        self.record_context.as_ref()
    }

    /// Clears the contextual record type.
    pub fn clear_record_context(&mut self) {
        self.record_context = None;
    }

    /// Sets the array type a typeless array literal should assume.
    pub fn set_array_context(&mut self, array_type: Rc<ArrayType>) {
        self.array_context = Some(array_type);
    }

    /// The contextual array type, if set.
    #[must_use]
    pub fn array_context(&self) -> Option<&Rc<ArrayType>> {
        self.array_context.as_ref()
    }

    /// Clears the contextual array type.
    pub fn clear_array_context(&mut self) {
        self.array_context = None;
    }

    // ------------------------------------------------------------------
    // old(expr) capture stack
    // ------------------------------------------------------------------

    /// Opens a capture frame for the `old(expr)` values of one contract
    /// scope.
    pub fn push_old_values(&mut self) {
        self.old_values.push(AHashMap::new());
    }

    /// Records a captured pre-state value into the innermost frame.
    pub fn record_old_value(&mut self, key: &str, value: Value) {
        if let Some(frame) = self.old_values.last_mut() {
            frame.insert(key.to_string(), value);
        }
    }

    /// Reads a captured pre-state value from the innermost frame.
    #[must_use]
    pub fn old_value(&self, key: &str) -> Option<Value> {
        self.old_values.last()?.get(key).cloned()
    }

    /// Closes the innermost capture frame.
    pub fn pop_old_values(&mut self) {
        self.old_values.pop();
    }

    // ------------------------------------------------------------------
    // Collaborators
    // ------------------------------------------------------------------

    /// The refcount manager.
    #[must_use]
    pub fn refcount(&self) -> &Rc<RefCountManager> {
        &self.refcount
    }

    /// The tracer.
    #[must_use]
    pub fn tracer(&self) -> &TracerRef {
        &self.tracer
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Wipes transient state for reuse: exceptions, control flow, call
    /// frames, contextual types, and `old` captures. The global
    /// environment and its bindings survive.
    pub fn reset(&mut self) {
        if let Some(outermost) = self.env_stack.first().cloned() {
            self.env = outermost;
        }
        self.env_stack.clear();
        self.call_stack.borrow_mut().clear();
        self.control.set(ControlFlow::None);
        self.exception = None;
        self.handler_exception = None;
        if let Some(setter) = &self.exception_setter {
            setter(None);
        }
        self.record_context = None;
        self.array_context = None;
        self.old_values.clear();
    }
}

/// A shallow clone: the environment stack is duplicated (sharing the scope
/// objects), while the call stack and control-flow slot are shared with
/// the original.
impl Clone for ExecutionContext {
    fn clone(&self) -> Self {
        Self {
            env: self.env.clone(),
            env_stack: self.env_stack.clone(),
            call_stack: self.call_stack.clone(),
            control: self.control.clone(),
            exception: self.exception.clone(),
            handler_exception: self.handler_exception.clone(),
            exception_getter: self.exception_getter.clone(),
            exception_setter: self.exception_setter.clone(),
            record_context: self.record_context.clone(),
            array_context: self.array_context.clone(),
            old_values: self.old_values.clone(),
            refcount: self.refcount.clone(),
            tracer: self.tracer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{callstack::CodeLoc, exception::ExceptionValue};

    fn frame(name: &str) -> StackFrame {
        StackFrame::new(name, "main.pas", CodeLoc::new(1, 1))
    }

    #[test]
    fn env_push_pop_restores_scopes() {
        let mut ctx = ExecutionContext::new();
        ctx.env().borrow_mut().define("x", Value::Int(1));
        ctx.push_env();
        ctx.env().borrow_mut().define("x", Value::Int(2));
        assert_eq!(ctx.env().borrow().get_local("x"), Some(Value::Int(2)));
        ctx.pop_env();
        assert_eq!(ctx.env().borrow().get_local("x"), Some(Value::Int(1)));
    }

    #[test]
    fn only_one_signal_at_a_time() {
        let ctx = ExecutionContext::new();
        assert_eq!(ctx.control(), ControlFlow::None);
        ctx.set_control(ControlFlow::Break);
        ctx.set_control(ControlFlow::Return);
        assert_eq!(ctx.control(), ControlFlow::Return);
        ctx.clear_control();
        assert!(!ctx.signal_active());
    }

    #[test]
    fn clone_shares_call_stack_and_control() {
        let mut ctx = ExecutionContext::new();
        let clone = ctx.clone();
        ctx.push_frame(frame("F")).unwrap();
        assert_eq!(clone.call_stack().borrow().depth(), 1);
        clone.set_control(ControlFlow::Exit);
        assert_eq!(ctx.control(), ControlFlow::Exit);
    }

    #[test]
    fn exception_mirror_callbacks_fire() {
        use std::cell::RefCell as StdRefCell;
        let mirror: Rc<StdRefCell<Option<ExceptionRef>>> = Rc::new(StdRefCell::new(None));
        let mirror_get = mirror.clone();
        let mirror_set = mirror.clone();

        let mut ctx = ExecutionContext::new();
        ctx.set_exception_callbacks(
            Rc::new(move || mirror_get.borrow().clone()),
            Rc::new(move |exc| *mirror_set.borrow_mut() = exc),
        );

        let exc = ExceptionValue::new(None, "boom", None, vec![]);
        ctx.set_exception(exc.clone());
        assert!(mirror.borrow().is_some(), "setter must mirror the raise");
        assert_eq!(ctx.exception().unwrap().message, "boom");
        ctx.clear_exception();
        assert!(mirror.borrow().is_none(), "setter must mirror the clear");
        assert!(ctx.exception().is_none());
    }

    #[test]
    fn old_values_stack_is_scoped() {
        let mut ctx = ExecutionContext::new();
        ctx.push_old_values();
        ctx.record_old_value("Count", Value::Int(5));
        assert_eq!(ctx.old_value("Count"), Some(Value::Int(5)));
        ctx.push_old_values();
        assert_eq!(ctx.old_value("Count"), None, "inner frame shadows");
        ctx.pop_old_values();
        assert_eq!(ctx.old_value("Count"), Some(Value::Int(5)));
        ctx.pop_old_values();
    }

    #[test]
    fn reset_wipes_transient_state() {
        let mut ctx = ExecutionContext::new();
        ctx.env().borrow_mut().define("keep", Value::Int(1));
        ctx.push_frame(frame("F")).unwrap();
        ctx.set_control(ControlFlow::Break);
        ctx.set_exception(ExceptionValue::new(None, "x", None, vec![]));
        ctx.push_old_values();

        ctx.reset();
        assert_eq!(ctx.call_stack().borrow().depth(), 0);
        assert_eq!(ctx.control(), ControlFlow::None);
        assert!(ctx.exception().is_none());
        assert_eq!(ctx.old_value("anything"), None);
        assert_eq!(ctx.env().borrow().get("keep"), Some(Value::Int(1)));
    }
}
