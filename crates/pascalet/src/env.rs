//! Case-insensitive lexical environments.
//!
//! An environment is one scope's bindings plus a link to the enclosing
//! scope. Keys are stored normalised; the originally written casing is kept
//! on the binding for diagnostics. `define` always writes the current
//! scope, `set` updates the nearest existing binding, and `get` walks
//! outward.

use std::{cell::RefCell, rc::Rc};

use indexmap::IndexMap;

use crate::{
    error::{RunError, RunResult},
    ident,
    value::Value,
};

/// Shared handle to an environment.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One binding: the name as written plus the bound value.
#[derive(Debug, Clone)]
pub struct Binding {
    /// Name as originally written.
    pub name: String,
    /// The bound value.
    pub value: Value,
}

/// One lexical scope.
#[derive(Debug, Default)]
pub struct Environment {
    /// Bindings keyed by normalised name, in definition order.
    values: IndexMap<String, Binding>,
    /// The enclosing scope, `None` for the global scope.
    enclosing: Option<EnvRef>,
}

impl Environment {
    /// Creates a global (outermost) environment.
    #[must_use]
    pub fn new() -> EnvRef {
        Rc::new(RefCell::new(Self::default()))
    }

    /// Creates a child scope enclosed by `outer`.
    #[must_use]
    pub fn new_enclosed(outer: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Self {
            values: IndexMap::new(),
            enclosing: Some(outer.clone()),
        }))
    }

    /// The enclosing scope.
    #[must_use]
    pub fn enclosing(&self) -> Option<&EnvRef> {
        self.enclosing.as_ref()
    }

    /// Creates or overwrites a binding in *this* scope.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(
            ident::normalize(name),
            Binding {
                name: name.to_string(),
                value,
            },
        );
    }

    /// Reads a binding, walking outer scopes.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        let key = ident::normalize(name);
        self.get_normalized(&key)
    }

    fn get_normalized(&self, key: &str) -> Option<Value> {
        if let Some(binding) = self.values.get(key) {
            return Some(binding.value.clone());
        }
        self.enclosing.as_ref()?.borrow().get_normalized(key)
    }

    /// Reads a binding in *this* scope only (shadow detection).
    #[must_use]
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(&ident::normalize(name)).map(|b| b.value.clone())
    }

    /// Updates the nearest existing binding. Fails when the name is
    /// nowhere defined.
    pub fn set(&mut self, name: &str, value: Value) -> RunResult<()> {
        let key = ident::normalize(name);
        if self.set_normalized(&key, value)? {
            Ok(())
        } else {
            Err(RunError::type_error(format!("undefined variable: {name}")))
        }
    }

    fn set_normalized(&mut self, key: &str, value: Value) -> RunResult<bool> {
        if let Some(binding) = self.values.get_mut(key) {
            binding.value = value;
            return Ok(true);
        }
        match &self.enclosing {
            Some(outer) => outer.borrow_mut().set_normalized(key, value),
            None => Ok(false),
        }
    }

    /// Returns `true` when the name resolves in this or any outer scope.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates this scope's bindings in definition order. Scope-exit
    /// cleanup uses this to release interface references.
    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.values.values()
    }

    /// Number of bindings in this scope.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` when this scope has no bindings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
