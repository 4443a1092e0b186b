//! Interface metadata.
//!
//! Interfaces are metadata-only at runtime: a name, an optional parent, the
//! declared method signatures, and properties. Instances are always backed
//! by an object (see [`InterfaceInstance`](crate::object::InterfaceInstance));
//! the interface itself never carries state.

use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::{
    ident,
    meta::{method::ParameterMetadata, property::PropertyDescriptor},
};

/// Shared handle to interface metadata. Interfaces are immutable once
/// declared, so a plain `Rc` suffices.
pub type InterfaceRef = Rc<InterfaceInfo>;

/// A method signature declared on an interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceMethod {
    /// Method name as written.
    pub name: String,
    /// Declared parameters.
    pub params: SmallVec<[ParameterMetadata; 4]>,
    /// Declared return type; `None` for procedures.
    pub return_type: Option<String>,
}

impl InterfaceMethod {
    /// Creates a parameterless procedure signature.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: SmallVec::new(),
            return_type: None,
        }
    }
}

/// AST-free descriptor of an interface declaration.
#[derive(Debug, Default)]
pub struct InterfaceInfo {
    /// Interface name as written.
    pub name: String,
    /// Parent interface, `None` for a root interface.
    pub parent: Option<InterfaceRef>,
    /// Declared method signatures, keyed by normalised name.
    pub methods: IndexMap<String, InterfaceMethod>,
    /// Declared properties, keyed by normalised name.
    pub properties: IndexMap<String, PropertyDescriptor>,
    /// Normalised name of the default property, if declared.
    pub default_property: Option<String>,
}

impl InterfaceInfo {
    /// Creates empty metadata for the named interface.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets the parent interface.
    #[must_use]
    pub fn with_parent(mut self, parent: InterfaceRef) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds a method signature.
    pub fn add_method(&mut self, method: InterfaceMethod) {
        self.methods.insert(ident::normalize(&method.name), method);
    }

    /// Adds a property, tracking the default property.
    pub fn add_property(&mut self, property: PropertyDescriptor) {
        let key = ident::normalize(&property.name);
        if property.is_default {
            self.default_property = Some(key.clone());
        }
        self.properties.insert(key, property);
    }

    /// Finds a method signature, walking the parent chain.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<&InterfaceMethod> {
        let key = ident::normalize(name);
        let mut current = Some(self);
        while let Some(iface) = current {
            if let Some(found) = iface.methods.get(&key) {
                return Some(found);
            }
            current = iface.parent.as_deref();
        }
        None
    }

    /// Finds a property descriptor, walking the parent chain.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<&PropertyDescriptor> {
        let key = ident::normalize(name);
        let mut current = Some(self);
        while let Some(iface) = current {
            if let Some(found) = iface.properties.get(&key) {
                return Some(found);
            }
            current = iface.parent.as_deref();
        }
        None
    }

    /// The default property, walking the parent chain.
    #[must_use]
    pub fn find_default_property(&self) -> Option<&PropertyDescriptor> {
        let mut current = Some(self);
        while let Some(iface) = current {
            if let Some(found) = iface.default_property.as_ref().and_then(|k| iface.properties.get(k)) {
                return Some(found);
            }
            current = iface.parent.as_deref();
        }
        None
    }

    /// Returns `true` when this interface is `name` or derives from it.
    #[must_use]
    pub fn extends(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(iface) = current {
            if ident::eq_ignore_case(&iface.name, name) {
                return true;
            }
            current = iface.parent.as_deref();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_lookup_walks_parents() {
        let mut base = InterfaceInfo::new("IBase");
        base.add_method(InterfaceMethod::new("Close"));
        let child = InterfaceInfo::new("IChild").with_parent(Rc::new(base));
        assert_eq!(child.find_method("CLOSE").unwrap().name, "Close");
        assert!(child.find_method("Open").is_none());
    }

    #[test]
    fn extends_covers_the_chain() {
        let base = Rc::new(InterfaceInfo::new("IBase"));
        let child = InterfaceInfo::new("IChild").with_parent(base);
        assert!(child.extends("ibase"));
        assert!(child.extends("IChild"));
        assert!(!child.extends("IOther"));
    }
}
