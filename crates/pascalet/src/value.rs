//! The polymorphic runtime value.
//!
//! `Value` is a tagged sum: small immediates (Integer, Float, Boolean, the
//! nil family) are stored inline, strings are counted immutable `Rc<str>`,
//! and shared composites (arrays, records, sets, objects) live behind
//! `Rc<RefCell<…>>` handles so a value clone is always cheap.
//!
//! Capabilities are opt-in: consumers probe with the predicate/accessor
//! methods here (`as_int`, `index_get`, `iter_value`, `unwrap_variant`,
//! `lookup_property`, ...) and handle absence through a typed
//! [`RunError`](crate::error::RunError), never a host panic. Semantic
//! equality and ordering live in [`arith`](crate::arith); the `PartialEq`
//! implementation on `Value` is identity-flavoured (handle equality for
//! shared composites) and exists for tests and map storage.

use std::{borrow::Cow, cell::Cell, fmt, rc::Rc};

use crate::{
    error::{RunError, RunResult},
    exception::ExceptionValue,
    lazy::{ExternalVar, LazyThunk, ReferenceValue},
    meta::{ClassRef, PropertyDescriptor},
    object::{InterfaceInstance, ObjectRef},
    strings,
    types::{
        ArrayRef, EnumType, EnumValue, FunctionPointer, JsonValue, RecordRef, RecordType, SetRef, SetType,
        SubrangeValue, VariantValue,
    },
};

thread_local! {
    /// Remaining display depth; stops runaway rendering of self-referential
    /// containers (an array can hold itself through its shared handle).
    static DISPLAY_DEPTH: Cell<usize> = const { Cell::new(0) };
}

const MAX_DISPLAY_DEPTH: usize = crate::limits::DEFAULT_MAX_DATA_DEPTH;

/// A first-class type value: classes, record/set/enum types, and aliases
/// can all be stored in variables and passed around.
#[derive(Debug, Clone)]
pub enum TypeMeta {
    /// A class reference (`TObject`).
    Class(ClassRef),
    /// A record type reference.
    Record(Rc<RecordType>),
    /// A set type reference.
    Set(Rc<SetType>),
    /// An enum type reference.
    Enum(Rc<EnumType>),
    /// A declared type alias.
    Alias {
        /// Alias name as written.
        name: Rc<str>,
        /// Name of the aliased type.
        target: Rc<str>,
    },
    /// A built-in type name (`Integer`, `String`, ...).
    Builtin(Rc<str>),
}

impl TypeMeta {
    /// The type tag for this kind of type value.
    #[must_use]
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Class(_) => "CLASS",
            Self::Record(_) => "RECORD_TYPE",
            Self::Set(_) => "SET_TYPE",
            Self::Enum(_) => "ENUM_TYPE",
            Self::Alias { .. } => "TYPE_ALIAS",
            Self::Builtin(_) => "TYPE_META",
        }
    }

    /// The designated type's name.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Class(class) => class.borrow().name.clone(),
            Self::Record(ty) => ty.name.clone(),
            Self::Set(ty) => ty.name.clone(),
            Self::Enum(ty) => ty.name.clone(),
            Self::Alias { name, .. } => name.to_string(),
            Self::Builtin(name) => name.to_string(),
        }
    }
}

/// A cursor over an iterable value.
///
/// `next` advances and reports whether an element is available; `current`
/// reads the element under the cursor; `reset` rewinds to before the first
/// element. Set iteration yields present ordinals in ascending order — as
/// enum values when the set's element type is an enumeration, as integers
/// otherwise.
#[derive(Debug)]
pub enum ValueCursor {
    /// Over an array's elements.
    Array { array: ArrayRef, pos: Option<usize> },
    /// Over a string's characters, yielding one-character strings.
    Str { chars: Vec<char>, pos: Option<usize> },
    /// Over a set's present ordinals.
    Set {
        ordinals: Vec<i64>,
        enum_type: Option<Rc<EnumType>>,
        pos: Option<usize>,
    },
}

impl ValueCursor {
    /// Advances the cursor. Returns `true` when an element is now current.
    pub fn next(&mut self) -> bool {
        let (len, pos) = match self {
            Self::Array { array, pos } => (array.borrow().len(), pos),
            Self::Str { chars, pos } => (chars.len(), pos),
            Self::Set { ordinals, pos, .. } => (ordinals.len(), pos),
        };
        let next = pos.map_or(0, |p| p + 1);
        if next < len {
            *pos = Some(next);
            true
        } else {
            *pos = Some(len);
            false
        }
    }

    /// The element under the cursor, if the cursor is on one.
    #[must_use]
    pub fn current(&self) -> Option<Value> {
        match self {
            Self::Array { array, pos } => {
                let array = array.borrow();
                array.elements().get((*pos)?).cloned()
            }
            Self::Str { chars, pos } => chars.get((*pos)?).map(|c| Value::Str(Rc::from(c.to_string().as_str()))),
            Self::Set {
                ordinals,
                enum_type,
                pos,
            } => {
                let ordinal = *ordinals.get((*pos)?)?;
                match enum_type.as_ref().and_then(|e| e.value_by_ordinal(ordinal)) {
                    Some(value) => Some(Value::Enum(value)),
                    None => Some(Value::Int(ordinal)),
                }
            }
        }
    }

    /// Rewinds to before the first element.
    pub fn reset(&mut self) {
        match self {
            Self::Array { pos, .. } | Self::Str { pos, .. } | Self::Set { pos, .. } => *pos = None,
        }
    }
}

/// The polymorphic runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// 64-bit signed integer.
    Int(i64),
    /// IEEE-754 binary64 float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Counted immutable Unicode string, 1-based for indexing.
    Str(Rc<str>),
    /// The nil object reference, optionally carrying the class name the
    /// slot was declared with (`TypedNil.ClassVar` support).
    Nil(Option<Rc<str>>),
    /// The variant Null value.
    Null,
    /// The variant Unassigned value.
    Unassigned,
    /// Array (shared handle).
    Array(ArrayRef),
    /// Record (shared handle; value semantics are realised by the
    /// evaluator calling [`Value::deep_copy`] on assignment).
    Record(RecordRef),
    /// Set (shared handle).
    Set(SetRef),
    /// Enumeration value.
    Enum(EnumValue),
    /// Bounds-checked subrange value. Reports the `INTEGER` tag — a
    /// subrange is an integer subtype.
    Subrange(SubrangeValue),
    /// JSON tree node view.
    Json(JsonValue),
    /// Variant box.
    Variant(Box<VariantValue>),
    /// Object instance (refcounted through the
    /// [`RefCountManager`](crate::refcount::RefCountManager)).
    Object(ObjectRef),
    /// Interface view onto an object.
    Interface(Rc<InterfaceInstance>),
    /// Function, method, or lambda pointer.
    FuncPtr(Rc<FunctionPointer>),
    /// Exception payload.
    Exception(Rc<ExceptionValue>),
    /// A reified host error.
    Error(Rc<RunError>),
    /// A first-class type value.
    TypeMeta(TypeMeta),
    /// Host-backed external variable.
    ExternalVar(Rc<ExternalVar>),
    /// A `var`-parameter reference binding.
    Reference(Rc<ReferenceValue>),
    /// A lazy parameter thunk, re-evaluated on each access.
    Lazy(Rc<LazyThunk>),
}

impl Value {
    /// The Boolean true singleton.
    pub const TRUE: Self = Self::Bool(true);
    /// The Boolean false singleton.
    pub const FALSE: Self = Self::Bool(false);

    /// The plain nil reference.
    #[must_use]
    pub fn nil() -> Self {
        Self::Nil(None)
    }

    /// A nil reference that remembers the class its slot was declared with.
    #[must_use]
    pub fn typed_nil(expected_class: &str) -> Self {
        Self::Nil(Some(Rc::from(expected_class)))
    }

    /// A string value from borrowed text.
    #[must_use]
    pub fn string(text: impl AsRef<str>) -> Self {
        Self::Str(Rc::from(text.as_ref()))
    }

    /// An object value.
    #[must_use]
    pub fn object(instance: ObjectRef) -> Self {
        Self::Object(instance)
    }

    /// The stable type tag (`"INTEGER"`, `"STRING"`, ...). Records report
    /// their record-type name when it is non-empty.
    #[must_use]
    pub fn type_name(&self) -> Cow<'static, str> {
        match self {
            Self::Int(_) => Cow::Borrowed("INTEGER"),
            Self::Float(_) => Cow::Borrowed("FLOAT"),
            Self::Bool(_) => Cow::Borrowed("BOOLEAN"),
            Self::Str(_) => Cow::Borrowed("STRING"),
            Self::Nil(_) => Cow::Borrowed("NIL"),
            Self::Null => Cow::Borrowed("NULL"),
            Self::Unassigned => Cow::Borrowed("UNASSIGNED"),
            Self::Array(_) => Cow::Borrowed("ARRAY"),
            Self::Record(record) => {
                let name = record.borrow().record_type().name.clone();
                if name.is_empty() {
                    Cow::Borrowed("RECORD")
                } else {
                    Cow::Owned(name)
                }
            }
            Self::Set(_) => Cow::Borrowed("SET"),
            Self::Enum(_) => Cow::Borrowed("ENUM"),
            Self::Subrange(_) => Cow::Borrowed("INTEGER"),
            Self::Json(_) => Cow::Borrowed("JSON"),
            Self::Variant(_) => Cow::Borrowed("VARIANT"),
            Self::Object(_) => Cow::Borrowed("OBJECT"),
            Self::Interface(_) => Cow::Borrowed("INTERFACE"),
            Self::FuncPtr(ptr) => Cow::Borrowed(ptr.kind.type_tag()),
            Self::Exception(_) => Cow::Borrowed("EXCEPTION"),
            Self::Error(_) => Cow::Borrowed("ERROR"),
            Self::TypeMeta(meta) => Cow::Borrowed(meta.type_tag()),
            Self::ExternalVar(_) => Cow::Borrowed("EXTERNAL_VAR"),
            Self::Reference(_) => Cow::Borrowed("REFERENCE"),
            Self::Lazy(_) => Cow::Borrowed("LAZY_THUNK"),
        }
    }

    // ------------------------------------------------------------------
    // Numeric capability
    // ------------------------------------------------------------------

    /// Integer view. Floats deliberately have no integer view — arithmetic
    /// prefers the integer path only when *both* operands are integer
    /// variants.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Subrange(s) => Some(s.value()),
            Self::Variant(v) => v.unwrap_variant().as_int(),
            _ => None,
        }
    }

    /// Float view: integers widen, floats pass through.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(n) => Some(*n as f64),
            Self::Float(x) => Some(*x),
            Self::Subrange(s) => Some(s.value() as f64),
            Self::Variant(v) => v.unwrap_variant().as_float(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // ReferenceType capability
    // ------------------------------------------------------------------

    /// Returns `true` for the nil reference.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil(_))
    }

    // ------------------------------------------------------------------
    // Copyable capability
    // ------------------------------------------------------------------

    /// Copy with record value semantics: records produce an independent
    /// deep copy (nested records recursively), everything else copies by
    /// value-equivalence (immediates) or shares its handle (arrays,
    /// objects, sets).
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        match self {
            Self::Record(record) => Self::Record(record.borrow().deep_copy()),
            other => other.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Indexable capability
    // ------------------------------------------------------------------

    /// Element count: array elements, string characters, JSON
    /// array/object members. `None` for non-indexable values.
    #[must_use]
    pub fn length(&self) -> Option<i64> {
        match self {
            Self::Array(array) => Some(array.borrow().len() as i64),
            Self::Str(s) => Some(s.chars().count() as i64),
            Self::Json(json) => Some(json.len() as i64),
            _ => None,
        }
    }

    /// Indexed read. Strings are 1-based; arrays follow their declared low
    /// bound; JSON arrays are 0-based.
    pub fn index_get(&self, index: i64) -> RunResult<Self> {
        match self {
            Self::Array(array) => array.borrow().get(index),
            Self::Str(s) => strings::char_at(s, index),
            Self::Json(json) => {
                if index < 0 {
                    return Err(RunError::index(index, 0, json.len() as i64 - 1, "json"));
                }
                Ok(Self::Json(json.element(index as usize)))
            }
            other => Err(RunError::type_error(format!(
                "value of type {tag} is not indexable",
                tag = other.type_name()
            ))),
        }
    }

    /// Indexed write. Strings are immutable — writing through an index is
    /// refused.
    pub fn index_set(&self, index: i64, value: Self) -> RunResult<()> {
        match self {
            Self::Array(array) => array.borrow_mut().set(index, value),
            Self::Str(_) => Err(RunError::type_error("string values are immutable")),
            other => Err(RunError::type_error(format!(
                "value of type {tag} is not indexable",
                tag = other.type_name()
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Iterable capability
    // ------------------------------------------------------------------

    /// A cursor over this value's elements, when the value is iterable.
    #[must_use]
    pub fn iter_value(&self) -> Option<ValueCursor> {
        match self {
            Self::Array(array) => Some(ValueCursor::Array {
                array: array.clone(),
                pos: None,
            }),
            Self::Str(s) => Some(ValueCursor::Str {
                chars: s.chars().collect(),
                pos: None,
            }),
            Self::Set(set) => {
                let set = set.borrow();
                Some(ValueCursor::Set {
                    ordinals: set.ordinals(),
                    enum_type: set.set_type().enum_type.clone(),
                    pos: None,
                })
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // VariantWrapper capability
    // ------------------------------------------------------------------

    /// Boxes this value into a variant, recording its type tag. Boxing an
    /// existing variant refuses to nest and hands the variant back
    /// unchanged.
    #[must_use]
    pub fn box_variant(&self) -> Self {
        match self {
            Self::Variant(_) => self.clone(),
            other => Self::Variant(Box::new(VariantValue::wrap(other.clone()))),
        }
    }

    /// Unwraps a variant box; non-variants unwrap to themselves.
    #[must_use]
    pub fn unwrap_variant(&self) -> Self {
        match self {
            Self::Variant(v) => v.unwrap_variant(),
            other => other.clone(),
        }
    }

    /// Returns `true` for a default-constructed variant that was never
    /// assigned.
    #[must_use]
    pub fn is_uninitialized(&self) -> bool {
        matches!(self, Self::Variant(v) if v.is_uninitialized())
    }

    // ------------------------------------------------------------------
    // PropertyAccessor capability
    // ------------------------------------------------------------------

    /// Looks up a property descriptor on an object (class chain) or record
    /// (record metadata).
    #[must_use]
    pub fn lookup_property(&self, name: &str) -> Option<PropertyDescriptor> {
        match self {
            Self::Object(obj) => {
                let class = obj.borrow().class().clone();
                crate::meta::ClassMetadata::find_property(&class, name)
            }
            Self::Interface(iface) => iface.iface().find_property(name).cloned(),
            Self::Record(record) => record.borrow().lookup_property(name),
            _ => None,
        }
    }

    /// The default property of an object's class or a record's type.
    #[must_use]
    pub fn default_property(&self) -> Option<PropertyDescriptor> {
        match self {
            Self::Object(obj) => {
                let class = obj.borrow().class().clone();
                crate::meta::ClassMetadata::find_default_property(&class)
            }
            Self::Interface(iface) => iface.iface().find_default_property().cloned(),
            Self::Record(record) => record.borrow().default_property(),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Convertible capability
    // ------------------------------------------------------------------

    /// Explicit conversion to a named target type.
    pub fn convert_to(&self, target: &str) -> RunResult<Self> {
        crate::convert::convert_to(self, target)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::string(v)
    }
}

/// Identity-flavoured equality: immediates compare by payload, shared
/// composites by handle identity. Field-wise/semantic equality is
/// [`arith::values_equal`](crate::arith::values_equal).
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Nil(_), Self::Nil(_)) => true,
            (Self::Null, Self::Null) | (Self::Unassigned, Self::Unassigned) => true,
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Record(a), Self::Record(b)) => Rc::ptr_eq(a, b),
            (Self::Set(a), Self::Set(b)) => Rc::ptr_eq(a, b),
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Subrange(a), Self::Subrange(b)) => a == b,
            (Self::Json(a), Self::Json(b)) => a == b,
            (Self::Variant(a), Self::Variant(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Rc::ptr_eq(a, b),
            (Self::Interface(a), Self::Interface(b)) => Rc::ptr_eq(a, b),
            (Self::FuncPtr(a), Self::FuncPtr(b)) => Rc::ptr_eq(a, b),
            (Self::Exception(a), Self::Exception(b)) => Rc::ptr_eq(a, b),
            (Self::Error(a), Self::Error(b)) => a == b,
            (Self::ExternalVar(a), Self::ExternalVar(b)) => Rc::ptr_eq(a, b),
            (Self::Reference(a), Self::Reference(b)) => Rc::ptr_eq(a, b),
            (Self::Lazy(a), Self::Lazy(b)) => Rc::ptr_eq(a, b),
            (Self::TypeMeta(a), Self::TypeMeta(b)) => match (a, b) {
                (TypeMeta::Class(x), TypeMeta::Class(y)) => Rc::ptr_eq(x, y),
                (TypeMeta::Record(x), TypeMeta::Record(y)) => Rc::ptr_eq(x, y),
                (TypeMeta::Set(x), TypeMeta::Set(y)) => Rc::ptr_eq(x, y),
                (TypeMeta::Enum(x), TypeMeta::Enum(y)) => Rc::ptr_eq(x, y),
                (TypeMeta::Alias { name: n1, target: t1 }, TypeMeta::Alias { name: n2, target: t2 }) => {
                    n1 == n2 && t1 == t2
                }
                (TypeMeta::Builtin(x), TypeMeta::Builtin(y)) => x == y,
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => fmt_float(f, *x),
            Self::Bool(b) => f.write_str(if *b { "True" } else { "False" }),
            Self::Str(s) => f.write_str(s),
            Self::Nil(_) => f.write_str("nil"),
            Self::Null => f.write_str("Null"),
            Self::Unassigned => f.write_str("Unassigned"),
            Self::Array(array) => with_display_depth(f, |f| {
                f.write_str("[")?;
                for (i, element) in array.borrow().elements().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str("]")
            }),
            Self::Record(record) => with_display_depth(f, |f| write!(f, "{rec}", rec = record.borrow())),
            Self::Set(set) => write!(f, "{set}", set = set.borrow()),
            Self::Enum(e) => write!(f, "{e}"),
            Self::Subrange(s) => write!(f, "{s}"),
            Self::Json(json) => write!(f, "{json}"),
            Self::Variant(v) => write!(f, "{v}"),
            Self::Object(obj) => f.write_str(&obj.borrow().class().borrow().name),
            Self::Interface(iface) => f.write_str(&iface.iface().name),
            Self::FuncPtr(ptr) => write!(f, "{ptr}"),
            Self::Exception(exc) => write!(f, "{exc}"),
            Self::Error(err) => write!(f, "{err}"),
            Self::TypeMeta(meta) => f.write_str(&meta.name()),
            Self::ExternalVar(var) => f.write_str(var.name()),
            Self::Reference(reference) => write!(f, "@{name}", name = reference.name()),
            Self::Lazy(_) => f.write_str("<lazy>"),
        }
    }
}

/// Runs a nested display step under the thread-local depth guard, writing
/// an ellipsis once the depth limit is reached.
fn with_display_depth(
    f: &mut fmt::Formatter<'_>,
    body: impl FnOnce(&mut fmt::Formatter<'_>) -> fmt::Result,
) -> fmt::Result {
    let depth = DISPLAY_DEPTH.with(Cell::get);
    if depth >= MAX_DISPLAY_DEPTH {
        return f.write_str("...");
    }
    DISPLAY_DEPTH.with(|d| d.set(depth + 1));
    let result = body(f);
    DISPLAY_DEPTH.with(|d| d.set(depth));
    result
}

/// Formats a float: `INF`/`-INF`/`NaN` for the non-finite forms, shortest
/// round-trip representation otherwise.
fn fmt_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        f.write_str("NaN")
    } else if x.is_infinite() {
        f.write_str(if x > 0.0 { "INF" } else { "-INF" })
    } else {
        let mut buffer = ryu::Buffer::new();
        f.write_str(buffer.format(x))
    }
}
