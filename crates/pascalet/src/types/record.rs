//! Record type descriptors and record values.
//!
//! Records are value types: assignment and parameter passing deep-copy the
//! structure. Nested records copy recursively; objects held in record fields
//! share references (a record copy never clones object identity). Field
//! access is case-insensitive with the canonical stored key fixed at first
//! insertion, and `set_field` never creates fields.

use std::{cell::RefCell, fmt, rc::Rc};

use indexmap::IndexMap;

use crate::{
    ident,
    meta::{PropertyDescriptor, RecordMetaRef},
    value::Value,
};

/// Shared handle to a record value.
pub type RecordRef = Rc<RefCell<RecordValue>>;

/// One declared field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTypeField {
    /// Field name as written.
    pub name: String,
    /// Declared type name.
    pub field_type: String,
}

/// Declared record type: the name and field layout.
#[derive(Debug, Default)]
pub struct RecordType {
    /// Type name as written.
    pub name: String,
    /// Declared fields, keyed by normalised name, in declaration order.
    fields: IndexMap<String, RecordTypeField>,
}

impl RecordType {
    /// Creates a record type from `(field name, type name)` pairs in
    /// declaration order.
    pub fn new(
        name: impl Into<String>,
        fields: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Rc<Self> {
        let fields = fields
            .into_iter()
            .map(|(field_name, field_type)| {
                let field = RecordTypeField {
                    name: field_name.into(),
                    field_type: field_type.into(),
                };
                (ident::normalize(&field.name), field)
            })
            .collect();
        Rc::new(Self {
            name: name.into(),
            fields,
        })
    }

    /// Declared fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &RecordTypeField> {
        self.fields.values()
    }

    /// Number of declared fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Looks up a declared field by (case-insensitive) name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&RecordTypeField> {
        self.fields.get(&ident::normalize(name))
    }
}

/// A value-typed map from field name to value.
#[derive(Debug)]
pub struct RecordValue {
    record_type: Rc<RecordType>,
    /// Member metadata (methods, properties); shared with every copy.
    metadata: Option<RecordMetaRef>,
    /// Field slots keyed by normalised name, insertion order = declaration
    /// order. The original casing lives on the record type.
    fields: IndexMap<String, Value>,
}

impl RecordValue {
    /// Creates a record with every declared field present. When an
    /// initialiser is given it supplies the zero value per field; otherwise
    /// fields start as Unassigned.
    #[must_use]
    pub fn new(
        record_type: Rc<RecordType>,
        metadata: Option<RecordMetaRef>,
        init: Option<&dyn Fn(&RecordTypeField) -> Value>,
    ) -> RecordRef {
        let fields = record_type
            .fields
            .iter()
            .map(|(key, field)| {
                let value = init.map_or(Value::Unassigned, |f| f(field));
                (key.clone(), value)
            })
            .collect();
        Rc::new(RefCell::new(Self {
            record_type,
            metadata,
            fields,
        }))
    }

    /// The declared type.
    #[must_use]
    pub fn record_type(&self) -> &Rc<RecordType> {
        &self.record_type
    }

    /// The member metadata, if the type declared any members.
    #[must_use]
    pub fn metadata(&self) -> Option<&RecordMetaRef> {
        self.metadata.as_ref()
    }

    /// Reads a field by (case-insensitive) name.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields.get(&ident::normalize(name)).cloned()
    }

    /// Writes a field by (case-insensitive) name. Returns `false` for
    /// unknown names — a write never creates a field.
    pub fn set_field(&mut self, name: &str, value: Value) -> bool {
        match self.fields.get_mut(&ident::normalize(name)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// The field slots in declaration order, as `(normalised name, value)`.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Deep copy: an independent record whose nested records are themselves
    /// copied; primitives copy by value-equivalence, objects and arrays
    /// share references. The metadata handle is shared.
    #[must_use]
    pub fn deep_copy(&self) -> RecordRef {
        let fields = self
            .fields
            .iter()
            .map(|(key, value)| (key.clone(), value.deep_copy()))
            .collect();
        Rc::new(RefCell::new(Self {
            record_type: self.record_type.clone(),
            metadata: self.metadata.clone(),
            fields,
        }))
    }

    /// Looks up a property descriptor declared on this record type.
    #[must_use]
    pub fn lookup_property(&self, name: &str) -> Option<PropertyDescriptor> {
        self.metadata.as_ref()?.borrow().find_property(name)
    }

    /// The record type's default property, if declared.
    #[must_use]
    pub fn default_property(&self) -> Option<PropertyDescriptor> {
        self.metadata.as_ref()?.borrow().find_default_property()
    }
}

impl fmt::Display for RecordValue {
    /// Renders `(a: 1; b: x)`. Field names are sorted for the string form;
    /// storage order stays declaration order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.write_str("(")?;
        for (i, key) in names.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            let display_name = self.record_type.fields.get(*key).map_or(*key, |field| field.name.as_str());
            write!(f, "{display_name}: {value}", value = self.fields[*key])?;
        }
        f.write_str(")")
    }
}
