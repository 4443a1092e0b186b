//! Configurable execution limits.
//!
//! The core enforces two structural limits: the call-stack depth (a bounded
//! frame vector, refused pushes surface as
//! [`RunError::StackOverflow`](crate::error::RunError::StackOverflow)) and
//! the recursion depth used by data-structure operations such as record deep
//! copy and value display, which would otherwise follow arbitrarily nested
//! user data.
//!
//! Timeouts and memory budgets are deliberately absent at this layer; an
//! embedder wanting them inserts periodic checks into statement execution
//! and unwinds through the normal control-flow and exception channels.

/// Default maximum call-stack depth.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1024;

/// Default maximum recursion depth for data operations (copy, display,
/// equality over nested records/arrays).
pub const DEFAULT_MAX_DATA_DEPTH: usize = 32;

/// Structural limits applied by the runtime core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeLimits {
    /// Maximum number of frames the [`CallStack`](crate::callstack::CallStack)
    /// will accept.
    pub max_call_depth: usize,
    /// Maximum nesting depth honoured by recursive value operations.
    pub max_data_depth: usize,
}

impl Default for RuntimeLimits {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_data_depth: DEFAULT_MAX_DATA_DEPTH,
        }
    }
}

impl RuntimeLimits {
    /// Returns limits with the given call depth and the default data depth.
    #[must_use]
    pub fn with_call_depth(max_call_depth: usize) -> Self {
        Self {
            max_call_depth,
            ..Self::default()
        }
    }
}
