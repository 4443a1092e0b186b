//! Lazy-parameter thunks, `var`-parameter references, and external
//! variables.
//!
//! All three hold opaque callbacks closing over whatever environment the
//! evaluator chose — the seam that keeps the core decoupled from the
//! environment representation. A [`LazyThunk`] re-runs its callback on
//! *every* access (no caching), which is what makes Jensen's-Device
//! patterns work; a [`ReferenceValue`] is the only mechanism by which a
//! callee mutates a caller's variable through a `var` parameter.

use std::{fmt, rc::Rc};

use crate::{
    error::{RunError, RunResult},
    value::Value,
};

/// Callback evaluating a deferred expression in its defining environment.
pub type ThunkFn = Rc<dyn Fn() -> RunResult<Value>>;

/// Callback reading a referenced variable.
pub type GetterFn = Rc<dyn Fn() -> RunResult<Value>>;

/// Callback writing a referenced variable.
pub type SetterFn = Rc<dyn Fn(Value) -> RunResult<()>>;

/// A deferred expression, re-evaluated on each access.
pub struct LazyThunk {
    /// Source text of the expression, for diagnostics.
    expr_text: String,
    eval: ThunkFn,
}

impl LazyThunk {
    /// Creates a thunk over an evaluator callback that captures the
    /// defining environment.
    pub fn new(expr_text: impl Into<String>, eval: ThunkFn) -> Rc<Self> {
        Rc::new(Self {
            expr_text: expr_text.into(),
            eval,
        })
    }

    /// Evaluates the expression. Every call re-runs the callback — the
    /// result is never cached.
    pub fn evaluate(&self) -> RunResult<Value> {
        (self.eval)()
    }

    /// The expression's source text.
    #[must_use]
    pub fn expr_text(&self) -> &str {
        &self.expr_text
    }
}

impl fmt::Debug for LazyThunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyThunk").field("expr", &self.expr_text).finish_non_exhaustive()
    }
}

/// A `var`-parameter binding: reads and writes delegate to callbacks
/// closing over the caller's environment.
pub struct ReferenceValue {
    name: String,
    getter: GetterFn,
    setter: SetterFn,
}

impl ReferenceValue {
    /// Creates a reference for the named variable.
    pub fn new(name: impl Into<String>, getter: GetterFn, setter: SetterFn) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            getter,
            setter,
        })
    }

    /// The referenced variable's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the referenced variable.
    pub fn dereference(&self) -> RunResult<Value> {
        (self.getter)()
    }

    /// Writes the referenced variable in the caller's environment.
    pub fn assign(&self, value: Value) -> RunResult<()> {
        (self.setter)(value)
    }
}

impl fmt::Debug for ReferenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceValue").field("name", &self.name).finish_non_exhaustive()
    }
}

/// A host-backed variable: reads go through a getter callback, writes
/// through an optional setter (absent for read-only externals).
pub struct ExternalVar {
    name: String,
    getter: GetterFn,
    setter: Option<SetterFn>,
}

impl ExternalVar {
    /// Creates a read-write external variable.
    pub fn new(name: impl Into<String>, getter: GetterFn, setter: SetterFn) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            getter,
            setter: Some(setter),
        })
    }

    /// Creates a read-only external variable.
    pub fn read_only(name: impl Into<String>, getter: GetterFn) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            getter,
            setter: None,
        })
    }

    /// The external variable's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reads the external variable through the host.
    pub fn read(&self) -> RunResult<Value> {
        (self.getter)()
    }

    /// Writes the external variable through the host; fails for read-only
    /// externals.
    pub fn write(&self, value: Value) -> RunResult<()> {
        match &self.setter {
            Some(setter) => setter(value),
            None => Err(RunError::type_error(format!(
                "external variable '{name}' is read-only",
                name = self.name
            ))),
        }
    }
}

impl fmt::Debug for ExternalVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExternalVar")
            .field("name", &self.name)
            .field("writable", &self.setter.is_some())
            .finish_non_exhaustive()
    }
}
