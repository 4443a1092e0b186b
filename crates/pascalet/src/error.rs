//! Host-level runtime error taxonomy.
//!
//! These errors report a *wrong operation* at the core API boundary (a
//! conversion that cannot succeed, an index out of bounds, arithmetic on
//! incompatible operands). They are distinct from user-visible
//! [`ExceptionValue`](crate::exception::ExceptionValue)s, which flow through
//! the language-level try/except machinery. The evaluator decides whether a
//! host error is re-raised as a user exception or aborts execution.
//!
//! Every variant carries enough structure to reconstruct the failing
//! operation without parsing the display string, and the `is_*` predicates
//! let upper layers branch without fragile string matching.

use std::fmt;

use strum::{Display, IntoStaticStr};

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Discriminant for [`RunError`], usable as a stable error-kind label.
///
/// The string representation matches the classic error class names
/// (e.g. `ConversionError`), which is what diagnostics and tests key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum ErrorKind {
    ConversionError,
    ArithmeticError,
    ComparisonError,
    IndexError,
    NilError,
    TypeError,
    StackOverflowError,
}

/// A structured host-level runtime error.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    /// A value could not be converted to the requested target type.
    Conversion {
        /// Type tag of the source value.
        from: String,
        /// Name of the requested target type.
        to: String,
        /// Display form of the offending value, for diagnostics.
        value: String,
    },
    /// Overflow, division by zero, or a domain failure in arithmetic.
    Arithmetic {
        /// Human-readable description, e.g. `"integer overflow in addition"`.
        message: String,
    },
    /// Two values could not be compared or ordered.
    Comparison {
        /// Type tag of the left operand.
        left: String,
        /// Type tag of the right operand.
        right: String,
        /// The comparison that was attempted, e.g. `"ordering"`.
        operation: String,
    },
    /// An index fell outside the valid bounds of an indexable value.
    Index {
        /// The requested index.
        index: i64,
        /// Lowest valid index.
        low: i64,
        /// Highest valid index.
        high: i64,
        /// What was being indexed: `"array"`, `"string"`, ...
        container: &'static str,
    },
    /// An operation required a live reference but found nil.
    Nil {
        /// The operation that was attempted on the nil value.
        operation: String,
    },
    /// A value had the wrong shape for the requested operation.
    Type {
        /// Human-readable description of the mismatch.
        message: String,
    },
    /// The call stack reached its configured depth limit.
    ///
    /// The evaluator promotes this to the user-visible stack-overflow
    /// exception; within the core it is an ordinary host error.
    StackOverflow {
        /// Depth at which the push was refused.
        depth: usize,
    },
}

impl RunError {
    /// Builds a [`RunError::Conversion`].
    pub fn conversion(from: impl Into<String>, to: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Conversion {
            from: from.into(),
            to: to.into(),
            value: value.into(),
        }
    }

    /// Builds a [`RunError::Arithmetic`] with the given message.
    pub fn arithmetic(message: impl Into<String>) -> Self {
        Self::Arithmetic {
            message: message.into(),
        }
    }

    /// Builds a [`RunError::Comparison`] for the given operand type tags.
    pub fn comparison(left: impl Into<String>, right: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::Comparison {
            left: left.into(),
            right: right.into(),
            operation: operation.into(),
        }
    }

    /// Builds a [`RunError::Index`] citing the valid bounds.
    #[must_use]
    pub fn index(index: i64, low: i64, high: i64, container: &'static str) -> Self {
        Self::Index {
            index,
            low,
            high,
            container,
        }
    }

    /// Builds a [`RunError::Nil`] for the named operation.
    pub fn nil(operation: impl Into<String>) -> Self {
        Self::Nil {
            operation: operation.into(),
        }
    }

    /// Builds a [`RunError::Type`] with the given message.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }

    /// Returns the kind discriminant for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Conversion { .. } => ErrorKind::ConversionError,
            Self::Arithmetic { .. } => ErrorKind::ArithmeticError,
            Self::Comparison { .. } => ErrorKind::ComparisonError,
            Self::Index { .. } => ErrorKind::IndexError,
            Self::Nil { .. } => ErrorKind::NilError,
            Self::Type { .. } => ErrorKind::TypeError,
            Self::StackOverflow { .. } => ErrorKind::StackOverflowError,
        }
    }

    /// Returns `true` for [`RunError::Conversion`].
    #[must_use]
    pub fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// Returns `true` for [`RunError::Arithmetic`].
    #[must_use]
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Self::Arithmetic { .. })
    }

    /// Returns `true` for [`RunError::Comparison`].
    #[must_use]
    pub fn is_comparison(&self) -> bool {
        matches!(self, Self::Comparison { .. })
    }

    /// Returns `true` for [`RunError::Index`].
    #[must_use]
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index { .. })
    }

    /// Returns `true` for [`RunError::Nil`].
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil { .. })
    }

    /// Returns `true` for [`RunError::Type`].
    #[must_use]
    pub fn is_type(&self) -> bool {
        matches!(self, Self::Type { .. })
    }

    /// Returns `true` for [`RunError::StackOverflow`].
    #[must_use]
    pub fn is_stack_overflow(&self) -> bool {
        matches!(self, Self::StackOverflow { .. })
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conversion { from, to, value } => {
                write!(f, "ConversionError: cannot convert {from} '{value}' to {to}")
            }
            Self::Arithmetic { message } => write!(f, "ArithmeticError: {message}"),
            Self::Comparison { left, right, operation } => {
                write!(f, "ComparisonError: {operation} not defined between {left} and {right}")
            }
            Self::Index {
                index,
                low,
                high,
                container,
            } => {
                write!(f, "IndexError: {container} index {index} out of bounds [{low}..{high}]")
            }
            Self::Nil { operation } => write!(f, "NilError: {operation} on nil reference"),
            Self::Type { message } => write!(f, "TypeError: {message}"),
            Self::StackOverflow { depth } => {
                write!(f, "StackOverflowError: maximum call depth {depth} exceeded")
            }
        }
    }
}

impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(RunError::arithmetic("x").kind(), ErrorKind::ArithmeticError);
        assert_eq!(RunError::index(9, 1, 5, "string").kind(), ErrorKind::IndexError);
        assert_eq!(
            RunError::conversion("STRING", "INTEGER", "abc").kind(),
            ErrorKind::ConversionError
        );
    }

    #[test]
    fn predicates_do_not_overlap() {
        let err = RunError::type_error("bad shape");
        assert!(err.is_type());
        assert!(!err.is_conversion());
        assert!(!err.is_arithmetic());
        assert!(!err.is_index());
        assert!(!err.is_nil());
        assert!(!err.is_comparison());
    }

    #[test]
    fn index_error_cites_bounds() {
        let err = RunError::index(6, 1, 5, "string");
        assert_eq!(err.to_string(), "IndexError: string index 6 out of bounds [1..5]");
    }

    #[test]
    fn kind_display_matches_class_names() {
        assert_eq!(ErrorKind::ConversionError.to_string(), "ConversionError");
        assert_eq!(ErrorKind::NilError.to_string(), "NilError");
    }
}
