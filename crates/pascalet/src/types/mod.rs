//! Composite runtime value types: arrays, records, sets, enums, subranges,
//! the JSON variant, the variant box, and function pointers.

pub mod array;
pub mod enums;
pub mod funcptr;
pub mod json;
pub mod record;
pub mod set;
pub mod variant;

pub use array::{ArrayRef, ArrayType, ArrayValue};
pub use enums::{EnumType, EnumValue, SubrangeType, SubrangeValue};
pub use funcptr::{FuncKind, FunctionPointer, Invoker};
pub use json::{JsonKind, JsonValue};
pub use record::{RecordRef, RecordType, RecordTypeField, RecordValue};
pub use set::{IntRange, SetRef, SetStorageKind, SetType, SetValue};
pub use variant::VariantValue;
