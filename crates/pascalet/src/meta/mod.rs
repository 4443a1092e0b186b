//! AST-free metadata descriptors for classes, records, interfaces, helpers,
//! methods, properties, and operator overloads.
//!
//! Declaration processing builds these incrementally (create, add members,
//! wire parents, build VMTs) and the evaluator consults them at dispatch
//! time. All identifier-keyed maps use the normalised form from
//! [`ident`](crate::ident).

pub mod class;
pub mod helper;
pub mod interface;
pub mod method;
pub mod operator;
pub mod property;
pub mod record;

pub use class::{ClassMetadata, ClassRef, FieldMetadata, VmtSlot};
pub use helper::{HelperMetadata, HelperRef, HelperTable};
pub use interface::{InterfaceInfo, InterfaceMethod, InterfaceRef};
pub use method::{
    BytecodeId, MethodBody, MethodFlags, MethodId, MethodMetadata, NativeFn, NodeId, ParameterMetadata, Visibility,
};
pub use operator::{OperatorEntry, OperatorKind, OperatorSig, OperatorTable, resolve_operator};
pub use property::{PropertyAccess, PropertyDescriptor, PropertySource};
pub use record::{RecordMetaRef, RecordMetadata};
