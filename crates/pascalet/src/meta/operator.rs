//! Operator-overload registries.
//!
//! Each class carries an [`OperatorTable`] keyed by the operator kind and the
//! normalised operand type names. Resolution at a call site tries the left
//! operand's class chain first, then the right's (see
//! [`resolve_operator`]).

use std::sync::Arc;

use ahash::AHashMap;
use smallvec::SmallVec;
use strum::{Display, EnumString};

use crate::{
    ident,
    meta::{class::ClassRef, method::MethodMetadata},
};

/// Overloadable operators.
///
/// The string form is the operator symbol or keyword as written in source
/// (`"+"`, `"div"`, `"in"`, ...). `Implicit`/`Explicit` name the conversion
/// operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
pub enum OperatorKind {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Subtract,
    #[strum(serialize = "*")]
    Multiply,
    #[strum(serialize = "/")]
    Divide,
    #[strum(serialize = "div")]
    IntDiv,
    #[strum(serialize = "mod")]
    Modulo,
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = "<>")]
    NotEqual,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEqual,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEqual,
    #[strum(serialize = "in")]
    In,
    #[strum(serialize = "and")]
    And,
    #[strum(serialize = "or")]
    Or,
    #[strum(serialize = "xor")]
    Xor,
    #[strum(serialize = "not")]
    Not,
    #[strum(serialize = "neg")]
    Negate,
    #[strum(serialize = "implicit")]
    Implicit,
    #[strum(serialize = "explicit")]
    Explicit,
}

/// Signature an overload is registered under: the operator plus the
/// normalised operand type names in call order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorSig {
    pub op: OperatorKind,
    pub operands: SmallVec<[String; 2]>,
}

impl OperatorSig {
    /// Builds a signature, normalising the operand type names.
    pub fn new(op: OperatorKind, operands: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self {
            op,
            operands: operands.into_iter().map(|t| ident::normalize(t.as_ref())).collect(),
        }
    }
}

/// A registered operator overload.
#[derive(Debug, Clone)]
pub struct OperatorEntry {
    /// The implementing method.
    pub method: Arc<MethodMetadata>,
    /// Which operand position binds to the receiver (0 = left, 1 = right).
    pub self_position: usize,
    /// `true` when the implementation is a class method (no instance
    /// receiver).
    pub class_method: bool,
}

/// Per-class operator overload table.
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    entries: AHashMap<OperatorSig, OperatorEntry>,
}

impl OperatorTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an overload, replacing a previous entry for the same
    /// signature.
    pub fn register(&mut self, sig: OperatorSig, entry: OperatorEntry) {
        self.entries.insert(sig, entry);
    }

    /// Looks up an overload for the operator and operand type names.
    #[must_use]
    pub fn lookup(&self, op: OperatorKind, operands: &[&str]) -> Option<&OperatorEntry> {
        let sig = OperatorSig::new(op, operands.iter().copied());
        self.entries.get(&sig)
    }

    /// Number of registered overloads.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no overloads are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves an operator overload for a binary or unary application.
///
/// Tries the left operand's class chain first, then the right operand's —
/// the first match wins. Returns the entry together with the class that
/// supplied it.
#[must_use]
pub fn resolve_operator(
    left_class: Option<&ClassRef>,
    right_class: Option<&ClassRef>,
    op: OperatorKind,
    operands: &[&str],
) -> Option<(ClassRef, OperatorEntry)> {
    for side in [left_class, right_class].into_iter().flatten() {
        let mut current = Some(side.clone());
        while let Some(class) = current {
            let found = class.borrow().operators.lookup(op, operands).cloned();
            if let Some(entry) = found {
                return Some((class, entry));
            }
            let parent = class.borrow().parent.clone();
            current = parent;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::method::{MethodBody, NodeId};

    fn entry() -> OperatorEntry {
        OperatorEntry {
            method: Arc::new(MethodMetadata::new("Add", MethodBody::Ast(NodeId(1)))),
            self_position: 0,
            class_method: true,
        }
    }

    #[test]
    fn lookup_normalizes_operand_types() {
        let mut table = OperatorTable::new();
        table.register(OperatorSig::new(OperatorKind::Add, ["TVector", "TVector"]), entry());
        assert!(table.lookup(OperatorKind::Add, &["tvector", "TVECTOR"]).is_some());
        assert!(table.lookup(OperatorKind::Subtract, &["tvector", "tvector"]).is_none());
    }

    #[test]
    fn operator_kind_display_matches_source_form() {
        assert_eq!(OperatorKind::Add.to_string(), "+");
        assert_eq!(OperatorKind::IntDiv.to_string(), "div");
        assert_eq!(OperatorKind::In.to_string(), "in");
    }
}
