#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "numeric narrowing is checked")]
#![expect(clippy::cast_sign_loss, reason = "sign-changing casts are intentional")]
#![expect(clippy::cast_possible_wrap, reason = "length-to-index casts stay in range")]
#![expect(clippy::float_cmp, reason = "value equality is exact IEEE comparison")]

pub mod arith;
pub mod callstack;
pub mod context;
pub mod convert;
pub mod env;
pub mod error;
pub mod exception;
pub mod ident;
pub mod lazy;
pub mod limits;
pub mod meta;
pub mod object;
pub mod pool;
pub mod refcount;
pub mod registry;
pub mod strings;
pub mod tracer;
pub mod types;
pub mod value;

pub use crate::{
    callstack::{CallStack, CodeLoc, StackFrame},
    context::{ControlFlow, ExceptionGetter, ExceptionSetter, ExecutionContext},
    env::{Binding, EnvRef, Environment},
    error::{ErrorKind, RunError, RunResult},
    exception::{ExceptionRef, ExceptionValue},
    lazy::{ExternalVar, GetterFn, LazyThunk, ReferenceValue, SetterFn, ThunkFn},
    limits::{DEFAULT_MAX_CALL_DEPTH, RuntimeLimits},
    meta::{
        ClassMetadata, ClassRef, FieldMetadata, HelperMetadata, HelperTable, InterfaceInfo, InterfaceMethod,
        InterfaceRef, MethodBody, MethodFlags, MethodId, MethodMetadata, NativeFn, NodeId, OperatorEntry,
        OperatorKind, OperatorTable, ParameterMetadata, PropertyAccess, PropertyDescriptor, PropertySource,
        RecordMetaRef, RecordMetadata, Visibility, VmtSlot,
    },
    object::{InterfaceInstance, ObjectInstance, ObjectRef, PropertyDispatch, read_property, write_property},
    pool::{PoolStats, PoolTypeStats, float_value, int_value, pool_stats, release_value},
    refcount::{DestructorFn, RefCountManager},
    registry::{MethodRegistry, RegistryStats},
    tracer::{NoopTracer, RecordingTracer, RuntimeTracer, StderrTracer, TraceEvent, TracerRef, shared_tracer},
    types::{
        ArrayRef, ArrayType, ArrayValue, EnumType, EnumValue, FuncKind, FunctionPointer, IntRange, Invoker, JsonKind,
        JsonValue, RecordRef, RecordType, RecordTypeField, RecordValue, SetRef, SetStorageKind, SetType, SetValue,
        SubrangeType, SubrangeValue, VariantValue,
    },
    value::{TypeMeta, Value, ValueCursor},
};
