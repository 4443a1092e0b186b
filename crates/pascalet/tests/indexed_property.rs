//! The indexed-property accessor protocol.
//!
//! Builds a `TArray` class exposing `Items[i: Integer]: String` backed by
//! native `GetItem`/`SetItem` methods over an internal array field, and
//! drives it through `read_property`/`write_property` with a dispatch that
//! executes native bodies. The protocol rules under test: reads invoke the
//! getter, writes invoke the setter, and access without an index is
//! refused with the documented message.

use std::sync::Arc;

use pascalet::{
    ArrayType, ArrayValue, ClassMetadata, ClassRef, EnvRef, FieldMetadata, MethodBody, MethodMetadata, NodeId,
    ObjectInstance, ObjectRef, PropertyAccess, PropertyDescriptor, PropertyDispatch, PropertySource, RunError,
    RunResult, Value, read_property, write_property,
};

/// Executes native method bodies with the receiver prepended to the
/// argument list (the registry convention).
struct NativeDispatch;

impl PropertyDispatch for NativeDispatch {
    fn call_method(&mut self, method: &Arc<MethodMetadata>, receiver: &Value, args: &[Value]) -> RunResult<Value> {
        match &method.body {
            MethodBody::Native(body) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(receiver.clone());
                full.extend_from_slice(args);
                body(&full)
            }
            other => Err(RunError::type_error(format!("expected a native body, got {other:?}"))),
        }
    }

    fn eval_getter_expr(&mut self, _node: NodeId, _env: &EnvRef) -> RunResult<Value> {
        Err(RunError::type_error("no expression getters in this test"))
    }
}

fn items_field(receiver: &Value) -> RunResult<Value> {
    let Value::Object(obj) = receiver else {
        return Err(RunError::type_error("GetItem/SetItem need an object receiver"));
    };
    obj.borrow()
        .get_field("FItems")
        .ok_or_else(|| RunError::type_error("FItems missing"))
}

fn get_item(args: &[Value]) -> RunResult<Value> {
    let index = args[1].as_int().ok_or_else(|| RunError::type_error("index must be an integer"))?;
    items_field(&args[0])?.index_get(index)
}

fn set_item(args: &[Value]) -> RunResult<Value> {
    let index = args[1].as_int().ok_or_else(|| RunError::type_error("index must be an integer"))?;
    items_field(&args[0])?.index_set(index, args[2].clone())?;
    Ok(Value::Unassigned)
}

/// `TArray` with three string slots and the `Items` indexed property.
fn array_class() -> ClassRef {
    let class = ClassMetadata::new_ref("TArray");
    {
        let mut meta = class.borrow_mut();
        meta.add_field(FieldMetadata::new("FItems", "array of String"));
        meta.add_method(Arc::new(MethodMetadata::new(
            "GetItem",
            MethodBody::Native(Arc::new(get_item)),
        )));
        meta.add_method(Arc::new(MethodMetadata::new(
            "SetItem",
            MethodBody::Native(Arc::new(set_item)),
        )));
        meta.add_property(
            PropertyDescriptor::new("Items", PropertySource::Class("TArray".into()))
                .with_read(PropertyAccess::Method("GetItem".into()))
                .with_write(PropertyAccess::Method("SetItem".into()))
                .indexed()
                .default_property(),
        );
    }
    class
}

fn new_array_object(class: &ClassRef) -> ObjectRef {
    let obj = ObjectInstance::new(class, None);
    let storage = ArrayValue::from_elements(
        ArrayType::dynamic("String"),
        vec![Value::string("a"), Value::string("b"), Value::string("c")],
    );
    obj.borrow_mut().set_field("FItems", Value::Array(storage));
    obj
}

// =============================================================================
// 1. Reads invoke the getter
// =============================================================================

/// Reading `arr.Items[2]` invokes `GetItem(2)`.
#[test]
fn read_invokes_get_item() {
    let class = array_class();
    let obj = new_array_object(&class);
    let descriptor = obj.borrow().class().borrow().properties["items"].clone();

    let got = read_property(&obj, &descriptor, Some(&Value::Int(2)), &mut NativeDispatch).unwrap();
    assert_eq!(got, Value::string("c"));
}

// =============================================================================
// 2. Writes invoke the setter
// =============================================================================

/// Writing `arr.Items[0] := 'x'` invokes `SetItem(0, 'x')`.
#[test]
fn write_invokes_set_item() {
    let class = array_class();
    let obj = new_array_object(&class);
    let descriptor = obj.borrow().class().borrow().properties["items"].clone();

    write_property(&obj, &descriptor, Some(&Value::Int(0)), Value::string("x"), &mut NativeDispatch).unwrap();
    let got = read_property(&obj, &descriptor, Some(&Value::Int(0)), &mut NativeDispatch).unwrap();
    assert_eq!(got, Value::string("x"));
}

// =============================================================================
// 3. Protocol violations
// =============================================================================

/// `arr.Items` without an index is refused with the documented message.
#[test]
fn access_without_index_is_refused() {
    let class = array_class();
    let obj = new_array_object(&class);
    let descriptor = obj.borrow().class().borrow().properties["items"].clone();

    let err = read_property(&obj, &descriptor, None, &mut NativeDispatch).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: indexed property 'Items' requires index");
}

/// An out-of-range index propagates the array's IndexError through the
/// getter.
#[test]
fn out_of_range_index_propagates() {
    let class = array_class();
    let obj = new_array_object(&class);
    let descriptor = obj.borrow().class().borrow().properties["items"].clone();

    let err = read_property(&obj, &descriptor, Some(&Value::Int(9)), &mut NativeDispatch).unwrap_err();
    assert!(err.is_index(), "expected IndexError, got {err}");
}

/// The property is the class's default property, discoverable through the
/// value-level accessor.
#[test]
fn items_is_the_default_property() {
    let class = array_class();
    let obj = new_array_object(&class);
    let value = Value::Object(obj);
    let descriptor = value.default_property().unwrap();
    assert_eq!(descriptor.name, "Items");
    assert!(descriptor.indexed);
    assert!(value.lookup_property("ITEMS").is_some(), "lookup is case-insensitive");
}
