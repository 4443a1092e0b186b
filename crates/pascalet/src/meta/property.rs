//! Property descriptors.
//!
//! A property exposes read and/or write access through either a backing
//! field, an accessor method, or (for getters) an expression node evaluated
//! in an environment bound to the instance's fields. Indexed properties must
//! be method-backed; the access-protocol rules themselves are enforced in
//! [`object`](crate::object).

use crate::meta::method::NodeId;

/// How one side (read or write) of a property is realised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyAccess {
    /// Direct access to a backing field by name.
    Field(String),
    /// Dispatch through an accessor method by name.
    Method(String),
    /// Getter only: an expression evaluated with the instance's fields
    /// bound into the environment.
    Expr(NodeId),
}

impl PropertyAccess {
    /// Returns `true` for field-backed access.
    #[must_use]
    pub fn is_field(&self) -> bool {
        matches!(self, Self::Field(_))
    }

    /// Returns `true` for method-backed access.
    #[must_use]
    pub fn is_method(&self) -> bool {
        matches!(self, Self::Method(_))
    }
}

/// The kind of declarer a property descriptor came from.
///
/// This is a small closed sum where the original design carried an opaque
/// `Impl` pointer; consumers that need the underlying declaration look it up
/// on the named declarer instead of downcasting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySource {
    /// Declared on a class; carries the class name.
    Class(String),
    /// Declared on a record type; carries the record type name.
    Record(String),
    /// Declared on an interface; carries the interface name.
    Interface(String),
    /// Declared on a helper; carries the helper name.
    Helper(String),
}

/// AST-free descriptor of a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Property name as declared (original casing).
    pub name: String,
    /// Read access, if readable.
    pub read: Option<PropertyAccess>,
    /// Write access, if writable.
    pub write: Option<PropertyAccess>,
    /// `Items[i: Integer]`-style indexed property.
    pub indexed: bool,
    /// Marked `default` on its declarer.
    pub is_default: bool,
    /// Where the property was declared.
    pub source: PropertySource,
}

impl PropertyDescriptor {
    /// Creates a readable, writable, non-indexed property.
    pub fn new(name: impl Into<String>, source: PropertySource) -> Self {
        Self {
            name: name.into(),
            read: None,
            write: None,
            indexed: false,
            is_default: false,
            source,
        }
    }

    /// Sets the read access.
    #[must_use]
    pub fn with_read(mut self, read: PropertyAccess) -> Self {
        self.read = Some(read);
        self
    }

    /// Sets the write access.
    #[must_use]
    pub fn with_write(mut self, write: PropertyAccess) -> Self {
        self.write = Some(write);
        self
    }

    /// Marks the property indexed.
    #[must_use]
    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    /// Marks the property as its declarer's default property.
    #[must_use]
    pub fn default_property(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Returns `true` when the property has no write access.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.write.is_none()
    }
}
