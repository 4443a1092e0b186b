//! Class metadata and virtual dispatch tables.
//!
//! A [`ClassMetadata`] is the AST-free descriptor of a class declaration:
//! fields, methods (with overload lists), constructors, the destructor,
//! properties, evaluated constants, class variables, implemented interface
//! names, operator overloads, and the virtual method table. Every map is
//! keyed by the case-normalised identifier; original casing lives on the
//! member metadata itself.
//!
//! # Virtual dispatch
//!
//! The VMT maps a method name to a list of *slots*, ordered base-first. A
//! `virtual` declaration introduces a slot; `override` replaces the
//! implementation in the slot it inherits; `reintroduce` starts a fresh slot,
//! breaking the chain — calls bound through an ancestor reference keep
//! dispatching within the ancestor's slot, which holds the most-derived
//! non-reintroduced implementation. [`ClassMetadata::resolve_virtual`] picks
//! the slot visible from the static (declared) class and answers with the
//! runtime class's implementation for that same slot.

use std::{cell::RefCell, rc::Rc, sync::Arc};

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::{
    ident,
    meta::{
        method::{MethodMetadata, NodeId, Visibility},
        operator::OperatorTable,
        property::PropertyDescriptor,
    },
    value::Value,
};

/// Shared handle to class metadata. Classes are wired into parent chains and
/// mutated incrementally during declaration processing, hence the interior
/// mutability.
pub type ClassRef = Rc<RefCell<ClassMetadata>>;

/// AST-free descriptor of a declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMetadata {
    /// Field name as written.
    pub name: String,
    /// Declared type name.
    pub field_type: String,
    /// Member visibility.
    pub visibility: Visibility,
    /// Field initialiser expression, if declared.
    pub default: Option<NodeId>,
}

impl FieldMetadata {
    /// Creates a public field with no initialiser.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            visibility: Visibility::default(),
            default: None,
        }
    }
}

/// One slot in a class's virtual method table.
#[derive(Debug, Clone)]
pub struct VmtSlot {
    /// Normalised name of the class that introduced this slot.
    pub introducing_class: String,
    /// Most-derived implementation for this slot at this class.
    pub method: Arc<MethodMetadata>,
    /// `true` when the slot was opened by a `reintroduce` declaration.
    pub reintroduced: bool,
}

/// AST-free descriptor of a class declaration.
#[derive(Debug, Default)]
pub struct ClassMetadata {
    /// Class name as written.
    pub name: String,
    /// Parent class, `None` for the root.
    pub parent: Option<ClassRef>,
    /// Names of implemented interfaces, original casing.
    pub interfaces: Vec<String>,
    /// Declared fields, keyed by normalised name, in declaration order.
    pub fields: IndexMap<String, FieldMetadata>,
    /// Primary method per normalised name (the first registered overload).
    pub methods: IndexMap<String, Arc<MethodMetadata>>,
    /// All overloads per normalised name, registration order.
    pub overloads: AHashMap<String, Vec<Arc<MethodMetadata>>>,
    /// Class methods, keyed by normalised name.
    pub class_methods: AHashMap<String, Arc<MethodMetadata>>,
    /// Constructors, keyed by normalised name.
    pub constructors: AHashMap<String, Arc<MethodMetadata>>,
    /// Normalised name of the default constructor (first registered;
    /// one named `Create` wins).
    pub default_constructor: Option<String>,
    /// The destructor, if declared (inherited otherwise).
    pub destructor: Option<Arc<MethodMetadata>>,
    /// Virtual method table: normalised name to slots, base slot first.
    pub vmt: AHashMap<String, Vec<VmtSlot>>,
    /// Evaluated class constants, keyed by normalised name.
    pub constants: AHashMap<String, Value>,
    /// Class variables, keyed by normalised name. Mutated at runtime.
    pub class_vars: AHashMap<String, Value>,
    /// Properties, keyed by normalised name.
    pub properties: AHashMap<String, PropertyDescriptor>,
    /// Normalised name of the default property, if declared.
    pub default_property: Option<String>,
    /// Operator overloads declared on this class.
    pub operators: OperatorTable,
    /// Declared `abstract`.
    pub is_abstract: bool,
    /// Declared `external`.
    pub is_external: bool,
    /// Declared `partial`.
    pub is_partial: bool,
    /// External binding name for external classes.
    pub external_name: Option<String>,
}

impl ClassMetadata {
    /// Creates empty metadata for the named class.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Creates empty metadata wrapped in the shared handle form.
    pub fn new_ref(name: impl Into<String>) -> ClassRef {
        Rc::new(RefCell::new(Self::new(name)))
    }

    /// Wires the parent class. Call before [`ClassMetadata::build_vmt`].
    pub fn set_parent(&mut self, parent: ClassRef) {
        self.parent = Some(parent);
    }

    /// Records an implemented interface name.
    pub fn add_interface(&mut self, name: impl Into<String>) {
        self.interfaces.push(name.into());
    }

    /// Adds a field. The normalised name is the map key; re-adding replaces.
    pub fn add_field(&mut self, field: FieldMetadata) {
        self.fields.insert(ident::normalize(&field.name), field);
    }

    /// Registers a method, routing it to the right table based on its flags:
    /// constructors and destructors go to their dedicated slots, class
    /// methods to the class-method table, everything else to the instance
    /// method table plus the overload list.
    pub fn add_method(&mut self, method: Arc<MethodMetadata>) {
        if method.flags.is_constructor {
            self.add_constructor(method);
            return;
        }
        if method.flags.is_destructor {
            self.destructor = Some(method);
            return;
        }
        let key = ident::normalize(&method.name);
        if method.flags.is_class_method {
            self.class_methods.insert(key, method);
            return;
        }
        self.methods.entry(key.clone()).or_insert_with(|| method.clone());
        self.overloads.entry(key).or_default().push(method);
    }

    /// Registers a constructor and maintains the default-constructor choice:
    /// the first registered constructor is the default unless one named
    /// `Create` appears, which always wins.
    pub fn add_constructor(&mut self, method: Arc<MethodMetadata>) {
        let key = ident::normalize(&method.name);
        if self.default_constructor.is_none() || key == "create" {
            self.default_constructor = Some(key.clone());
        }
        self.constructors.insert(key, method);
    }

    /// Adds a property, tracking the default property.
    pub fn add_property(&mut self, property: PropertyDescriptor) {
        let key = ident::normalize(&property.name);
        if property.is_default {
            self.default_property = Some(key.clone());
        }
        self.properties.insert(key, property);
    }

    /// Stores an evaluated class constant.
    pub fn set_constant(&mut self, name: &str, value: Value) {
        self.constants.insert(ident::normalize(name), value);
    }

    /// Stores or updates a class variable.
    pub fn set_class_var(&mut self, name: &str, value: Value) {
        self.class_vars.insert(ident::normalize(name), value);
    }

    /// Reads a class variable declared on this class (no chain walk).
    #[must_use]
    pub fn class_var(&self, name: &str) -> Option<Value> {
        self.class_vars.get(&ident::normalize(name)).cloned()
    }

    /// The normalised form of this class's name.
    #[must_use]
    pub fn normalized_name(&self) -> String {
        ident::normalize(&self.name)
    }

    /// Builds this class's VMT from its parent's (which must be built
    /// first) and its own method declarations.
    pub fn build_vmt(&mut self) {
        let mut vmt: AHashMap<String, Vec<VmtSlot>> = self
            .parent
            .as_ref()
            .map(|p| p.borrow().vmt.clone())
            .unwrap_or_default();
        let own_name = self.normalized_name();

        for (key, method) in &self.methods {
            let flags = method.flags;
            if flags.is_override {
                // Override continues the inherited slot; a stray override
                // with no inherited slot opens one.
                match vmt.get_mut(key).and_then(|slots| slots.last_mut()) {
                    Some(slot) => slot.method = method.clone(),
                    None => vmt.entry(key.clone()).or_default().push(VmtSlot {
                        introducing_class: own_name.clone(),
                        method: method.clone(),
                        reintroduced: false,
                    }),
                }
            } else if flags.is_virtual {
                // A fresh `virtual` (with or without `reintroduce`) opens a
                // new slot; the old slot keeps dispatching for ancestor-typed
                // references.
                vmt.entry(key.clone()).or_default().push(VmtSlot {
                    introducing_class: own_name.clone(),
                    method: method.clone(),
                    reintroduced: flags.is_reintroduce,
                });
            }
        }
        self.vmt = vmt;
    }

    /// Finds a field along the class chain.
    #[must_use]
    pub fn find_field(class: &ClassRef, name: &str) -> Option<FieldMetadata> {
        let key = ident::normalize(name);
        Self::walk(class, |c| c.fields.get(&key).cloned())
    }

    /// Finds the primary instance method along the class chain.
    #[must_use]
    pub fn find_method(class: &ClassRef, name: &str) -> Option<Arc<MethodMetadata>> {
        let key = ident::normalize(name);
        Self::walk(class, |c| c.methods.get(&key).cloned())
    }

    /// Finds every overload for the name along the class chain, nearest
    /// class first.
    #[must_use]
    pub fn find_overloads(class: &ClassRef, name: &str) -> Vec<Arc<MethodMetadata>> {
        let key = ident::normalize(name);
        let mut all = Vec::new();
        let mut current = Some(class.clone());
        while let Some(c) = current {
            if let Some(list) = c.borrow().overloads.get(&key) {
                all.extend(list.iter().cloned());
            }
            let parent = c.borrow().parent.clone();
            current = parent;
        }
        all
    }

    /// Finds a class method along the class chain.
    #[must_use]
    pub fn find_class_method(class: &ClassRef, name: &str) -> Option<Arc<MethodMetadata>> {
        let key = ident::normalize(name);
        Self::walk(class, |c| c.class_methods.get(&key).cloned())
    }

    /// Finds a constructor along the class chain.
    #[must_use]
    pub fn find_constructor(class: &ClassRef, name: &str) -> Option<Arc<MethodMetadata>> {
        let key = ident::normalize(name);
        Self::walk(class, |c| c.constructors.get(&key).cloned())
    }

    /// Finds the default constructor along the class chain.
    #[must_use]
    pub fn find_default_constructor(class: &ClassRef) -> Option<Arc<MethodMetadata>> {
        Self::walk(class, |c| {
            c.default_constructor
                .as_ref()
                .and_then(|key| c.constructors.get(key))
                .cloned()
        })
    }

    /// Finds the destructor along the class chain (destructors are
    /// inherited when unspecified).
    #[must_use]
    pub fn find_destructor(class: &ClassRef) -> Option<Arc<MethodMetadata>> {
        Self::walk(class, |c| c.destructor.clone())
    }

    /// Finds an evaluated constant along the class chain.
    #[must_use]
    pub fn find_constant(class: &ClassRef, name: &str) -> Option<Value> {
        let key = ident::normalize(name);
        Self::walk(class, |c| c.constants.get(&key).cloned())
    }

    /// Finds a class variable along the class chain.
    #[must_use]
    pub fn find_class_var(class: &ClassRef, name: &str) -> Option<Value> {
        let key = ident::normalize(name);
        Self::walk(class, |c| c.class_vars.get(&key).cloned())
    }

    /// Finds a property descriptor along the class chain.
    #[must_use]
    pub fn find_property(class: &ClassRef, name: &str) -> Option<PropertyDescriptor> {
        let key = ident::normalize(name);
        Self::walk(class, |c| c.properties.get(&key).cloned())
    }

    /// Finds the default property along the class chain.
    #[must_use]
    pub fn find_default_property(class: &ClassRef) -> Option<PropertyDescriptor> {
        Self::walk(class, |c| {
            c.default_property
                .as_ref()
                .and_then(|key| c.properties.get(key))
                .cloned()
        })
    }

    /// Resolves a virtual call: the slot is chosen by the static (declared)
    /// class, the implementation by the runtime class. Returns `None` when
    /// the static class has no virtual slot for the name (the call is then
    /// an ordinary chain lookup).
    #[must_use]
    pub fn resolve_virtual(
        static_class: &ClassRef,
        runtime_class: &ClassRef,
        name: &str,
    ) -> Option<Arc<MethodMetadata>> {
        let key = ident::normalize(name);
        let introducing = static_class
            .borrow()
            .vmt
            .get(&key)
            .and_then(|slots| slots.last())
            .map(|slot| slot.introducing_class.clone())?;
        runtime_class
            .borrow()
            .vmt
            .get(&key)
            .and_then(|slots| slots.iter().find(|s| s.introducing_class == introducing))
            .map(|slot| slot.method.clone())
    }

    /// Returns `true` when `class` is `ancestor` or derives from it.
    #[must_use]
    pub fn is_descendant_of(class: &ClassRef, ancestor_name: &str) -> bool {
        Self::walk(class, |c| {
            ident::eq_ignore_case(&c.name, ancestor_name).then_some(())
        })
        .is_some()
    }

    /// Returns `true` when `class` or any ancestor declares the interface.
    #[must_use]
    pub fn implements_interface(class: &ClassRef, interface_name: &str) -> bool {
        Self::walk(class, |c| {
            c.interfaces
                .iter()
                .any(|i| ident::eq_ignore_case(i, interface_name))
                .then_some(())
        })
        .is_some()
    }

    /// Collects the declared fields of the full chain, root class first, in
    /// declaration order. Used to lay out instance field storage.
    #[must_use]
    pub fn all_fields(class: &ClassRef) -> Vec<FieldMetadata> {
        let mut chain = Vec::new();
        let mut current = Some(class.clone());
        while let Some(c) = current {
            chain.push(c.clone());
            let parent = c.borrow().parent.clone();
            current = parent;
        }
        let mut fields = Vec::new();
        for c in chain.into_iter().rev() {
            fields.extend(c.borrow().fields.values().cloned());
        }
        fields
    }

    /// Walks the class chain applying `pick` until it yields a value.
    fn walk<T>(class: &ClassRef, pick: impl Fn(&Self) -> Option<T>) -> Option<T> {
        let mut current = Some(class.clone());
        while let Some(c) = current {
            if let Some(found) = pick(&c.borrow()) {
                return Some(found);
            }
            let parent = c.borrow().parent.clone();
            current = parent;
        }
        None
    }
}
