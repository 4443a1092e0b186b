//! Object and interface instances.
//!
//! An [`ObjectInstance`] is field storage plus a class handle and the
//! refcount bookkeeping driven by the
//! [`RefCountManager`](crate::refcount::RefCountManager). Method lookup
//! follows the runtime class chain; virtual calls go through the VMT (see
//! [`ClassMetadata::resolve_virtual`]).
//!
//! The property accessor protocol lives here too. The core enforces the
//! protocol rules (indexed properties need method backing and an index,
//! read-only properties refuse writes) and delegates actual method calls
//! and getter-expression evaluation to the evaluator through the
//! [`PropertyDispatch`] seam.

use std::{cell::RefCell, rc::Rc, sync::Arc};

use indexmap::IndexMap;

use crate::{
    env::{EnvRef, Environment},
    error::{RunError, RunResult},
    ident,
    meta::{ClassMetadata, ClassRef, FieldMetadata, InterfaceRef, MethodMetadata, NodeId, PropertyAccess, PropertyDescriptor},
    value::Value,
};

/// Shared handle to an object instance.
pub type ObjectRef = Rc<RefCell<ObjectInstance>>;

/// A class instance: field storage plus refcount state.
#[derive(Debug)]
pub struct ObjectInstance {
    class: ClassRef,
    /// Field slots keyed by normalised name, root-class fields first.
    fields: IndexMap<String, Value>,
    ref_count: usize,
    destroyed: bool,
    /// Depth of nested `Destroy` calls while an inherited destructor chain
    /// runs.
    destroy_call_depth: u32,
}

impl ObjectInstance {
    /// Creates an instance with every field of the class chain present.
    /// When an initialiser is given it supplies the zero value per field;
    /// otherwise fields start as Unassigned and the constructor fills them.
    ///
    /// The instance starts at refcount 0; the first binding increments it.
    #[must_use]
    pub fn new(class: &ClassRef, init: Option<&dyn Fn(&FieldMetadata) -> Value>) -> ObjectRef {
        let fields = ClassMetadata::all_fields(class)
            .into_iter()
            .map(|field| {
                let value = init.map_or(Value::Unassigned, |f| f(&field));
                (ident::normalize(&field.name), value)
            })
            .collect();
        Rc::new(RefCell::new(Self {
            class: class.clone(),
            fields,
            ref_count: 0,
            destroyed: false,
            destroy_call_depth: 0,
        }))
    }

    /// The instance's class.
    #[must_use]
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// The class name (for diagnostics).
    #[must_use]
    pub fn class_name(&self) -> String {
        self.class.borrow().name.clone()
    }

    /// Current reference count.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    /// Increments the reference count, returning the new count.
    pub fn inc_ref(&mut self) -> usize {
        self.ref_count += 1;
        self.ref_count
    }

    /// Decrements the reference count, clamping at 0. Returns the new
    /// count.
    pub fn dec_ref(&mut self) -> usize {
        self.ref_count = self.ref_count.saturating_sub(1);
        self.ref_count
    }

    /// `true` once the destructor has been entered; guards against
    /// re-destruction.
    #[must_use]
    pub fn destroyed(&self) -> bool {
        self.destroyed
    }

    /// Marks the instance destroyed. The destructor callback must call
    /// this *before* running the destructor body.
    pub fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }

    /// Enters a nested `Destroy` call (inherited destructor chains);
    /// returns the new depth.
    pub fn enter_destroy(&mut self) -> u32 {
        self.destroy_call_depth += 1;
        self.destroy_call_depth
    }

    /// Leaves a nested `Destroy` call; returns the new depth.
    pub fn exit_destroy(&mut self) -> u32 {
        self.destroy_call_depth = self.destroy_call_depth.saturating_sub(1);
        self.destroy_call_depth
    }

    /// Current nested `Destroy` depth.
    #[must_use]
    pub fn destroy_call_depth(&self) -> u32 {
        self.destroy_call_depth
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

    /// The field slots, root-class fields first, as `(normalised name,
    /// value)`.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Defines every field of this instance into `env` under its declared
    /// casing. Expression-backed property getters evaluate in such an
    /// environment.
    pub fn bind_fields_to_environment(&self, env: &EnvRef) {
        let declared = ClassMetadata::all_fields(&self.class);
        let mut env = env.borrow_mut();
        for field in declared {
            if let Some(value) = self.fields.get(&ident::normalize(&field.name)) {
                env.define(&field.name, value.clone());
            }
        }
    }

    /// Finds the primary instance method along the runtime class chain.
    /// Dispatch follows the runtime type for non-virtual methods too.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<Arc<MethodMetadata>> {
        ClassMetadata::find_method(&self.class, name)
    }

    /// Resolves a virtual call against this instance's runtime class, with
    /// the slot chosen by `static_class` (the reference's declared type).
    /// Falls back to the plain chain lookup when no virtual slot exists.
    #[must_use]
    pub fn resolve_method(&self, static_class: &ClassRef, name: &str) -> Option<Arc<MethodMetadata>> {
        ClassMetadata::resolve_virtual(static_class, &self.class, name).or_else(|| self.find_method(name))
    }
}

/// An interface view onto an object. Wrapping increments the object's
/// refcount (done by
/// [`RefCountManager::wrap_in_interface`](crate::refcount::RefCountManager::wrap_in_interface));
/// releasing the view decrements it.
#[derive(Debug)]
pub struct InterfaceInstance {
    iface: InterfaceRef,
    object: ObjectRef,
}

impl InterfaceInstance {
    /// Creates the view. Callers normally go through the refcount manager,
    /// which also increments the object.
    #[must_use]
    pub fn new(iface: InterfaceRef, object: ObjectRef) -> Self {
        Self { iface, object }
    }

    /// The interface metadata.
    #[must_use]
    pub fn iface(&self) -> &InterfaceRef {
        &self.iface
    }

    /// The backing object.
    #[must_use]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }
}

/// Evaluator-supplied dispatch seam for the property protocol: how to call
/// an accessor method and how to evaluate an expression-backed getter.
pub trait PropertyDispatch {
    /// Calls an accessor method with the receiver and arguments.
    fn call_method(&mut self, method: &Arc<MethodMetadata>, receiver: &Value, args: &[Value]) -> RunResult<Value>;

    /// Evaluates an expression-backed getter in an environment with the
    /// instance's fields bound.
    fn eval_getter_expr(&mut self, node: NodeId, env: &EnvRef) -> RunResult<Value>;
}

fn find_accessor(class: &ClassRef, property: &str, accessor: &str) -> RunResult<Arc<MethodMetadata>> {
    ClassMetadata::find_method(class, accessor)
        .or_else(|| ClassMetadata::find_class_method(class, accessor))
        .ok_or_else(|| {
            RunError::type_error(format!(
                "property '{property}' accessor method '{accessor}' not found"
            ))
        })
}

fn check_index_shape(descriptor: &PropertyDescriptor, index: Option<&Value>) -> RunResult<()> {
    if descriptor.indexed && index.is_none() {
        return Err(RunError::type_error(format!(
            "indexed property '{name}' requires index",
            name = descriptor.name
        )));
    }
    if !descriptor.indexed && index.is_some() {
        return Err(RunError::type_error(format!(
            "property '{name}' does not accept an index",
            name = descriptor.name
        )));
    }
    Ok(())
}

/// Reads a property on an object, enforcing the accessor protocol:
/// indexed properties must be method-backed and called with an index;
/// write-only properties refuse reads; expression getters evaluate with
/// the instance's fields bound to a fresh environment.
pub fn read_property(
    object: &ObjectRef,
    descriptor: &PropertyDescriptor,
    index: Option<&Value>,
    dispatch: &mut dyn PropertyDispatch,
) -> RunResult<Value> {
    check_index_shape(descriptor, index)?;
    let read = descriptor.read.as_ref().ok_or_else(|| {
        RunError::type_error(format!("property '{name}' is write-only", name = descriptor.name))
    })?;
    match read {
        PropertyAccess::Field(field) => {
            if descriptor.indexed {
                return Err(RunError::type_error(format!(
                    "indexed property '{name}' requires getter/setter method",
                    name = descriptor.name
                )));
            }
            object.borrow().get_field(field).ok_or_else(|| {
                RunError::type_error(format!(
                    "property '{name}' backing field '{field}' not found",
                    name = descriptor.name
                ))
            })
        }
        PropertyAccess::Method(accessor) => {
            let class = object.borrow().class().clone();
            let method = find_accessor(&class, &descriptor.name, accessor)?;
            let receiver = Value::Object(object.clone());
            let args: Vec<Value> = index.cloned().into_iter().collect();
            dispatch.call_method(&method, &receiver, &args)
        }
        PropertyAccess::Expr(node) => {
            let env = Environment::new();
            object.borrow().bind_fields_to_environment(&env);
            dispatch.eval_getter_expr(*node, &env)
        }
    }
}

/// Writes a property on an object, enforcing the accessor protocol:
/// read-only properties refuse writes, indexed properties must be
/// method-backed and called with an index.
pub fn write_property(
    object: &ObjectRef,
    descriptor: &PropertyDescriptor,
    index: Option<&Value>,
    value: Value,
    dispatch: &mut dyn PropertyDispatch,
) -> RunResult<()> {
    check_index_shape(descriptor, index)?;
    let write = descriptor.write.as_ref().ok_or_else(|| {
        RunError::type_error(format!("property '{name}' is read-only", name = descriptor.name))
    })?;
    match write {
        PropertyAccess::Field(field) => {
            if descriptor.indexed {
                return Err(RunError::type_error(format!(
                    "indexed property '{name}' requires getter/setter method",
                    name = descriptor.name
                )));
            }
            if object.borrow_mut().set_field(field, value) {
                Ok(())
            } else {
                Err(RunError::type_error(format!(
                    "property '{name}' backing field '{field}' not found",
                    name = descriptor.name
                )))
            }
        }
        PropertyAccess::Method(accessor) => {
            let class = object.borrow().class().clone();
            let method = find_accessor(&class, &descriptor.name, accessor)?;
            let receiver = Value::Object(object.clone());
            let mut args: Vec<Value> = index.cloned().into_iter().collect();
            args.push(value);
            dispatch.call_method(&method, &receiver, &args).map(|_| ())
        }
        PropertyAccess::Expr(_) => Err(RunError::type_error(format!(
            "property '{name}' cannot be written through an expression getter",
            name = descriptor.name
        ))),
    }
}
