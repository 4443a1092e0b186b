//! The JSON variant.
//!
//! A [`JsonValue`] wraps a node of an immutable JSON tree. Nodes are shared
//! (`Rc`) so member access hands out cheap sub-views; the *undefined* kind
//! models access to a member that does not exist, distinct from an explicit
//! JSON `null`. Display emits a JSON form, delegating recursively through
//! the tree.

use std::{fmt, rc::Rc};

use strum::Display;

use crate::error::{RunError, RunResult};

/// The kind of a JSON node. `Int` is split out from `Number` so integer
/// payloads survive round-trips without float conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum JsonKind {
    Undefined,
    Null,
    Bool,
    Int,
    Number,
    String,
    Array,
    Object,
}

/// An opaque view onto a JSON tree node.
#[derive(Debug, Clone, Default)]
pub struct JsonValue {
    /// `None` models the undefined kind (absent member access).
    node: Option<Rc<serde_json::Value>>,
}

impl JsonValue {
    /// The undefined value.
    #[must_use]
    pub fn undefined() -> Self {
        Self { node: None }
    }

    /// Wraps a parsed JSON tree.
    #[must_use]
    pub fn new(node: serde_json::Value) -> Self {
        Self {
            node: Some(Rc::new(node)),
        }
    }

    /// Parses JSON text into a value.
    pub fn parse(text: &str) -> RunResult<Self> {
        serde_json::from_str(text)
            .map(Self::new)
            .map_err(|e| RunError::conversion("STRING", "JSON", e.to_string()))
    }

    /// The node kind.
    #[must_use]
    pub fn kind(&self) -> JsonKind {
        match self.node.as_deref() {
            None => JsonKind::Undefined,
            Some(serde_json::Value::Null) => JsonKind::Null,
            Some(serde_json::Value::Bool(_)) => JsonKind::Bool,
            Some(serde_json::Value::Number(n)) => {
                if n.is_i64() {
                    JsonKind::Int
                } else {
                    JsonKind::Number
                }
            }
            Some(serde_json::Value::String(_)) => JsonKind::String,
            Some(serde_json::Value::Array(_)) => JsonKind::Array,
            Some(serde_json::Value::Object(_)) => JsonKind::Object,
        }
    }

    /// Returns `true` for the undefined kind.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        self.node.is_none()
    }

    /// Member access on an object node. Missing members — and member access
    /// on non-objects — yield undefined.
    #[must_use]
    pub fn member(&self, name: &str) -> Self {
        match self.node.as_deref() {
            Some(serde_json::Value::Object(map)) => map.get(name).cloned().map_or_else(Self::undefined, Self::new),
            _ => Self::undefined(),
        }
    }

    /// Element access on an array node. Out-of-range indexes — and element
    /// access on non-arrays — yield undefined.
    #[must_use]
    pub fn element(&self, index: usize) -> Self {
        match self.node.as_deref() {
            Some(serde_json::Value::Array(items)) => {
                items.get(index).cloned().map_or_else(Self::undefined, Self::new)
            }
            _ => Self::undefined(),
        }
    }

    /// Element count of an array or member count of an object; 0 otherwise.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.node.as_deref() {
            Some(serde_json::Value::Array(items)) => items.len(),
            Some(serde_json::Value::Object(map)) => map.len(),
            _ => 0,
        }
    }

    /// Returns `true` when `len() == 0`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Integer payload of an int node.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self.node.as_deref() {
            Some(serde_json::Value::Number(n)) => n.as_i64(),
            _ => None,
        }
    }

    /// Float payload of a numeric node.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self.node.as_deref() {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            _ => None,
        }
    }

    /// Bool payload of a bool node.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.node.as_deref() {
            Some(serde_json::Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// String payload of a string node.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self.node.as_deref() {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for JsonValue {
    fn eq(&self, other: &Self) -> bool {
        match (&self.node, &other.node) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for JsonValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node.as_deref() {
            None => f.write_str("Undefined"),
            Some(node) => write!(f, "{node}"),
        }
    }
}
