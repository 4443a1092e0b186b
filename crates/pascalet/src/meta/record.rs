//! Record metadata.
//!
//! Records are value types: no inheritance, no virtual dispatch, no
//! constructors or destructors. Their metadata is the class shape minus
//! those concerns — methods (with overloads), class methods, properties,
//! constants and class variables, and operator overloads.

use std::{cell::RefCell, rc::Rc, sync::Arc};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    ident,
    meta::{class::FieldMetadata, method::MethodMetadata, operator::OperatorTable, property::PropertyDescriptor},
    value::Value,
};

/// Shared handle to record metadata.
pub type RecordMetaRef = Rc<RefCell<RecordMetadata>>;

/// AST-free descriptor of a record type's members.
#[derive(Debug, Default)]
pub struct RecordMetadata {
    /// Record type name as written.
    pub name: String,
    /// Declared fields, keyed by normalised name, in declaration order.
    pub fields: IndexMap<String, FieldMetadata>,
    /// Primary method per normalised name.
    pub methods: IndexMap<String, Arc<MethodMetadata>>,
    /// All overloads per normalised name, registration order.
    pub overloads: AHashMap<String, Vec<Arc<MethodMetadata>>>,
    /// Class (static) methods, keyed by normalised name.
    pub class_methods: AHashMap<String, Arc<MethodMetadata>>,
    /// Evaluated constants, keyed by normalised name.
    pub constants: AHashMap<String, Value>,
    /// Class variables, keyed by normalised name. Mutated at runtime.
    pub class_vars: AHashMap<String, Value>,
    /// Properties, keyed by normalised name.
    pub properties: AHashMap<String, PropertyDescriptor>,
    /// Normalised name of the default property, if declared.
    pub default_property: Option<String>,
    /// Operator overloads declared on this record.
    pub operators: OperatorTable,
}

impl RecordMetadata {
    /// Creates empty metadata for the named record type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates empty metadata wrapped in the shared handle form.
    pub fn new_ref(name: impl Into<String>) -> RecordMetaRef {
        Rc::new(RefCell::new(Self::new(name)))
    }

    /// Adds a field. The normalised name is the map key; re-adding replaces.
    pub fn add_field(&mut self, field: FieldMetadata) {
        self.fields.insert(ident::normalize(&field.name), field);
    }

    /// Registers a method, routing class methods to their own table and
    /// keeping the overload list current.
    pub fn add_method(&mut self, method: Arc<MethodMetadata>) {
        let key = ident::normalize(&method.name);
        if method.flags.is_class_method {
            self.class_methods.insert(key, method);
            return;
        }
        self.methods.entry(key.clone()).or_insert_with(|| method.clone());
        self.overloads.entry(key).or_default().push(method);
    }

    /// Adds a property, tracking the default property.
    pub fn add_property(&mut self, property: PropertyDescriptor) {
        let key = ident::normalize(&property.name);
        if property.is_default {
            self.default_property = Some(key.clone());
        }
        self.properties.insert(key, property);
    }

    /// Stores an evaluated constant.
    pub fn set_constant(&mut self, name: &str, value: Value) {
        self.constants.insert(ident::normalize(name), value);
    }

    /// Stores or updates a class variable.
    pub fn set_class_var(&mut self, name: &str, value: Value) {
        self.class_vars.insert(ident::normalize(name), value);
    }

    /// Looks up a method by name.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<Arc<MethodMetadata>> {
        self.methods.get(&ident::normalize(name)).cloned()
    }

    /// Looks up a property descriptor by name.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<PropertyDescriptor> {
        self.properties.get(&ident::normalize(name)).cloned()
    }

    /// The default property, if declared.
    #[must_use]
    pub fn find_default_property(&self) -> Option<PropertyDescriptor> {
        self.default_property
            .as_ref()
            .and_then(|key| self.properties.get(key))
            .cloned()
    }
}
