//! Method and parameter metadata.
//!
//! A [`MethodMetadata`] is the AST-free descriptor of a callable: its name,
//! parameter list, return type, body handle, contract nodes, dispatch flags,
//! and visibility. Bodies reference the evaluator's world through opaque
//! handles — an AST [`NodeId`], a native function, or a bytecode id — so the
//! core never depends on the tree shape. Exactly one body form is active.

use std::{fmt, sync::Arc};

use smallvec::SmallVec;
use strum::{Display, EnumString};

use crate::{
    error::RunResult,
    value::Value,
};

/// Opaque handle to an AST node owned by the evaluator.
///
/// The core stores these in method bodies, contract lists, default-value
/// expressions, and expression-backed property getters; only the evaluator
/// can resolve them back to tree nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// Opaque handle to a compiled bytecode body (reserved for a future VM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BytecodeId(pub u32);

/// Dense monotonic handle into the [`MethodRegistry`](crate::registry::MethodRegistry).
///
/// Id 0 is reserved and never assigned; [`MethodId::INVALID`] can be used as
/// an "unset" sentinel in evaluator data structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(u32);

impl MethodId {
    /// The reserved invalid id.
    pub const INVALID: Self = Self(0);

    /// Creates an id from a raw registry index.
    #[must_use]
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw index value.
    #[inline]
    #[must_use]
    pub fn index(self) -> u32 {
        self.0
    }

    /// Returns `true` for any id the registry actually assigned.
    #[inline]
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{id}", id = self.0)
    }
}

/// Native method implementation supplied by the built-in library.
///
/// By convention the receiver (when there is one) is passed as the first
/// element of the argument slice.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> RunResult<Value> + Send + Sync>;

/// The body of a method. Exactly one of the three forms is active for the
/// life of the metadata.
#[derive(Clone)]
pub enum MethodBody {
    /// An AST body executed by the tree walker.
    Ast(NodeId),
    /// A native implementation.
    Native(NativeFn),
    /// A compiled bytecode body (future VM).
    Bytecode(BytecodeId),
}

impl fmt::Debug for MethodBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ast(node) => f.debug_tuple("Ast").field(node).finish(),
            Self::Native(_) => f.write_str("Native(..)"),
            Self::Bytecode(id) => f.debug_tuple("Bytecode").field(id).finish(),
        }
    }
}

/// Member visibility, following the Pascal section keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Visibility {
    Private,
    Protected,
    #[default]
    Public,
    Published,
}

/// Dispatch and role flags for a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MethodFlags {
    pub is_virtual: bool,
    pub is_abstract: bool,
    pub is_override: bool,
    pub is_reintroduce: bool,
    pub is_class_method: bool,
    pub is_constructor: bool,
    pub is_destructor: bool,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterMetadata {
    /// Parameter name as written.
    pub name: String,
    /// Declared type name.
    pub param_type: String,
    /// `var` parameter: the callee receives a [`ReferenceValue`](crate::lazy::ReferenceValue).
    pub by_ref: bool,
    /// Default-value expression; `None` means the parameter is required.
    pub default: Option<NodeId>,
}

impl ParameterMetadata {
    /// Creates a required by-value parameter.
    pub fn new(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            by_ref: false,
            default: None,
        }
    }

    /// Creates a `var` parameter.
    pub fn by_ref(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            by_ref: true,
            ..Self::new(name, param_type)
        }
    }

    /// Returns `true` when the caller must supply this argument.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.default.is_none()
    }
}

/// AST-free descriptor of a method, registered once at declaration time.
#[derive(Debug, Clone)]
pub struct MethodMetadata {
    /// Method name as declared (original casing).
    pub name: String,
    /// Declared parameters in order.
    pub params: SmallVec<[ParameterMetadata; 4]>,
    /// Declared return type; `None` for procedures.
    pub return_type: Option<String>,
    /// The body handle.
    pub body: MethodBody,
    /// `require` contract expressions, checked before the body.
    pub preconditions: Vec<NodeId>,
    /// `ensure` contract expressions, checked after the body.
    pub postconditions: Vec<NodeId>,
    /// Dispatch and role flags.
    pub flags: MethodFlags,
    /// Member visibility.
    pub visibility: Visibility,
}

impl MethodMetadata {
    /// Creates metadata for a plain public method with no parameters.
    pub fn new(name: impl Into<String>, body: MethodBody) -> Self {
        Self {
            name: name.into(),
            params: SmallVec::new(),
            return_type: None,
            body,
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            flags: MethodFlags::default(),
            visibility: Visibility::default(),
        }
    }

    /// Sets the parameter list.
    #[must_use]
    pub fn with_params(mut self, params: impl IntoIterator<Item = ParameterMetadata>) -> Self {
        self.params = params.into_iter().collect();
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn with_return_type(mut self, return_type: impl Into<String>) -> Self {
        self.return_type = Some(return_type.into());
        self
    }

    /// Sets the flags.
    #[must_use]
    pub fn with_flags(mut self, flags: MethodFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the visibility.
    #[must_use]
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Number of arguments the caller must supply (parameters without a
    /// default expression).
    #[must_use]
    pub fn required_arity(&self) -> usize {
        self.params.iter().filter(|p| p.is_required()).count()
    }

    /// Returns `true` when the method participates in virtual dispatch
    /// (declared `virtual` or continuing a virtual chain via `override`).
    #[must_use]
    pub fn is_virtual(&self) -> bool {
        self.flags.is_virtual || self.flags.is_override
    }
}
