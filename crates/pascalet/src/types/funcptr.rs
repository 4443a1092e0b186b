//! Function, method, and lambda pointer values.
//!
//! A pointer value pairs the registered method metadata (by id) with an
//! optional bound receiver and an *invoker* — an opaque callback installed
//! by the evaluator that closes over whatever it needs to actually run the
//! body. The core never executes code itself; calling through the pointer
//! delegates to the invoker.

use std::{fmt, rc::Rc};

use crate::{
    error::{RunError, RunResult},
    meta::MethodId,
    value::Value,
};

/// Callback that performs the actual call. The bound receiver, if any, is
/// already captured by the closure.
pub type Invoker = Rc<dyn Fn(&[Value]) -> RunResult<Value>>;

/// What kind of callable a pointer designates. The kind feeds the value's
/// type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuncKind {
    /// A free function.
    Function,
    /// A method with a bound receiver.
    Method,
    /// An anonymous function capturing its defining environment.
    Lambda,
}

impl FuncKind {
    /// The type tag for this pointer kind.
    #[must_use]
    pub fn type_tag(self) -> &'static str {
        match self {
            Self::Function => "FUNCTION_POINTER",
            Self::Method => "METHOD_POINTER",
            Self::Lambda => "LAMBDA",
        }
    }
}

/// A first-class callable value.
pub struct FunctionPointer {
    /// Pointer kind.
    pub kind: FuncKind,
    /// Name for diagnostics (`"Inc"`, `"TFoo.Bar"`, `"<lambda>"`).
    pub name: String,
    /// Registry id of the target method, when the target is registered.
    pub method: MethodId,
    /// Bound receiver for method pointers. Capturing a receiver increments
    /// its refcount (done by the evaluator through the refcount manager).
    pub self_value: Option<Value>,
    /// The call implementation installed by the evaluator.
    invoker: Option<Invoker>,
}

impl FunctionPointer {
    /// Creates a pointer with no invoker yet (metadata-only).
    pub fn new(kind: FuncKind, name: impl Into<String>, method: MethodId) -> Self {
        Self {
            kind,
            name: name.into(),
            method,
            self_value: None,
            invoker: None,
        }
    }

    /// Binds a receiver.
    #[must_use]
    pub fn with_self(mut self, self_value: Value) -> Self {
        self.self_value = Some(self_value);
        self
    }

    /// Installs the call implementation.
    #[must_use]
    pub fn with_invoker(mut self, invoker: Invoker) -> Self {
        self.invoker = Some(invoker);
        self
    }

    /// Wraps into a value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::FuncPtr(Rc::new(self))
    }

    /// Calls through the pointer with the given arguments.
    pub fn invoke(&self, args: &[Value]) -> RunResult<Value> {
        match &self.invoker {
            Some(invoker) => invoker(args),
            None => Err(RunError::nil(format!("call through '{name}'", name = self.name))),
        }
    }

    /// Returns `true` when the pointer can actually be called.
    #[must_use]
    pub fn is_callable(&self) -> bool {
        self.invoker.is_some()
    }
}

impl fmt::Debug for FunctionPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionPointer")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("method", &self.method)
            .field("bound", &self.self_value.is_some())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for FunctionPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            FuncKind::Lambda => f.write_str("<lambda>"),
            _ => write!(f, "@{name}", name = self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoke_without_invoker_is_a_nil_error() {
        let ptr = FunctionPointer::new(FuncKind::Function, "Orphan", MethodId::INVALID);
        assert!(ptr.invoke(&[]).unwrap_err().is_nil());
    }

    #[test]
    fn invoker_receives_the_arguments() {
        let ptr = FunctionPointer::new(FuncKind::Function, "Sum", MethodId::new(1)).with_invoker(Rc::new(|args| {
            let mut total = 0;
            for arg in args {
                if let Value::Int(n) = arg {
                    total += n;
                }
            }
            Ok(Value::Int(total))
        }));
        assert_eq!(ptr.invoke(&[Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(5));
    }
}
