//! Helper metadata.
//!
//! A helper is a non-owning extension of an existing target type: it adds
//! methods, properties, class variables and constants without changing the
//! target's layout. A helper method may also alias a built-in library
//! function, letting `s.ToUpper` dispatch to the builtin `UpperCase`.

use std::{cell::RefCell, rc::Rc, sync::Arc};

use ahash::AHashMap;

use crate::{
    ident,
    meta::{method::MethodMetadata, property::PropertyDescriptor},
    value::Value,
};

/// Shared handle to helper metadata.
pub type HelperRef = Rc<RefCell<HelperMetadata>>;

/// AST-free descriptor of a helper declaration.
#[derive(Debug, Default)]
pub struct HelperMetadata {
    /// Helper name as written.
    pub name: String,
    /// Name of the type this helper extends.
    pub target_type: String,
    /// Helper methods, keyed by normalised name.
    pub methods: AHashMap<String, Arc<MethodMetadata>>,
    /// Class variables, keyed by normalised name. Mutated at runtime.
    pub class_vars: AHashMap<String, Value>,
    /// Evaluated constants, keyed by normalised name.
    pub class_consts: AHashMap<String, Value>,
    /// Properties, keyed by normalised name.
    pub properties: AHashMap<String, PropertyDescriptor>,
    /// Helper-method name to built-in function name, for methods that are
    /// thin aliases over the built-in library.
    pub builtin_aliases: AHashMap<String, String>,
}

impl HelperMetadata {
    /// Creates empty metadata for a helper extending `target_type`.
    pub fn new(name: impl Into<String>, target_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_type: target_type.into(),
            ..Self::default()
        }
    }

    /// Creates empty metadata wrapped in the shared handle form.
    pub fn new_ref(name: impl Into<String>, target_type: impl Into<String>) -> HelperRef {
        Rc::new(RefCell::new(Self::new(name, target_type)))
    }

    /// Registers a helper method.
    pub fn add_method(&mut self, method: Arc<MethodMetadata>) {
        self.methods.insert(ident::normalize(&method.name), method);
    }

    /// Registers a property.
    pub fn add_property(&mut self, property: PropertyDescriptor) {
        self.properties.insert(ident::normalize(&property.name), property);
    }

    /// Records that the named helper method aliases a built-in function.
    pub fn add_builtin_alias(&mut self, method_name: &str, builtin_name: impl Into<String>) {
        self.builtin_aliases
            .insert(ident::normalize(method_name), builtin_name.into());
    }

    /// Looks up a helper method by name.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<Arc<MethodMetadata>> {
        self.methods.get(&ident::normalize(name)).cloned()
    }

    /// Returns the aliased built-in function name for a helper method.
    #[must_use]
    pub fn builtin_alias(&self, method_name: &str) -> Option<&str> {
        self.builtin_aliases
            .get(&ident::normalize(method_name))
            .map(String::as_str)
    }
}

/// Registry of helpers keyed by the normalised target type name. Several
/// helpers may extend the same type; lookup order is registration order
/// (the latest declaration wins, so iterate back to front).
#[derive(Debug, Default)]
pub struct HelperTable {
    by_target: AHashMap<String, Vec<HelperRef>>,
}

impl HelperTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a helper under its target type.
    pub fn register(&mut self, helper: HelperRef) {
        let key = ident::normalize(&helper.borrow().target_type);
        self.by_target.entry(key).or_default().push(helper);
    }

    /// All helpers extending the named type, registration order.
    #[must_use]
    pub fn for_target(&self, target_type: &str) -> &[HelperRef] {
        self.by_target
            .get(&ident::normalize(target_type))
            .map_or(&[], Vec::as_slice)
    }

    /// Finds a helper method for the target type, latest declaration first.
    #[must_use]
    pub fn find_method(&self, target_type: &str, name: &str) -> Option<Arc<MethodMetadata>> {
        self.for_target(target_type)
            .iter()
            .rev()
            .find_map(|h| h.borrow().find_method(name))
    }
}
