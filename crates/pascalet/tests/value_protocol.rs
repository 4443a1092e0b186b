//! Cross-cutting value-protocol laws: type-tag stability, arithmetic
//! overflow reporting, record copy semantics, conversion rules, and the
//! pool statistics surface.

use pascalet::{
    ArrayType, ArrayValue, ClassMetadata, ObjectInstance, RecordType, RecordValue, RunError, Value, arith, convert,
    pool,
};

// =============================================================================
// 1. Type tags are stable
// =============================================================================

/// `v.Type()` answers the same tag before and after String(), Copy(), and
/// equality checks — for composites too.
#[test]
fn composite_type_tags_survive_operations() {
    let array = Value::Array(ArrayValue::from_elements(
        ArrayType::dynamic("Integer"),
        vec![Value::Int(1)],
    ));
    let record = Value::Record(RecordValue::new(
        RecordType::new("TPoint", [("X", "Integer")]),
        None,
        Some(&|_| Value::Int(0)),
    ));
    let object = Value::Object(ObjectInstance::new(&ClassMetadata::new_ref("TThing"), None));

    for (value, tag) in [(array, "ARRAY"), (record.clone(), "TPoint"), (object, "OBJECT")] {
        assert_eq!(value.type_name(), tag);
        let _ = value.to_string();
        let copy = value.deep_copy();
        let _ = arith::values_equal(&value, &copy).unwrap();
        assert_eq!(value.type_name(), tag);
        assert_eq!(copy.type_name(), tag);
    }
}

/// A record with no type name falls back to the generic RECORD tag.
#[test]
fn anonymous_record_reports_generic_tag() {
    let record = Value::Record(RecordValue::new(
        RecordType::new("", [("X", "Integer")]),
        None,
        None,
    ));
    assert_eq!(record.type_name(), "RECORD");
}

// =============================================================================
// 2. Arithmetic overflow (seed scenario 1)
// =============================================================================

/// `IntegerValue(9223372036854775807) + IntegerValue(1)` reports integer
/// overflow in addition.
#[test]
fn max_int_plus_one_overflows() {
    let err = arith::add(&Value::Int(9_223_372_036_854_775_807), &Value::Int(1)).unwrap_err();
    assert_eq!(err, RunError::arithmetic("integer overflow in addition"));
    assert!(err.is_arithmetic());
}

/// Everything below the overflow line is exact integer arithmetic.
#[test]
fn non_overflowing_arithmetic_is_exact() {
    assert_eq!(
        arith::add(&Value::Int(i64::MAX - 1), &Value::Int(1)).unwrap(),
        Value::Int(i64::MAX)
    );
    assert_eq!(
        arith::mul(&Value::Int(3_037_000_499), &Value::Int(3_037_000_499)).unwrap(),
        Value::Int(9_223_372_030_926_249_001)
    );
}

/// Division and modulo by zero are arithmetic errors; all other outcomes
/// are integers.
#[test]
fn division_by_zero_is_reported() {
    for op in [arith::int_div, arith::int_mod] {
        let err = op(&Value::Int(1), &Value::Int(0)).unwrap_err();
        assert_eq!(err, RunError::arithmetic("division by zero"));
    }
    assert_eq!(arith::int_div(&Value::Int(9), &Value::Int(4)).unwrap(), Value::Int(2));
    assert_eq!(arith::int_mod(&Value::Int(9), &Value::Int(4)).unwrap(), Value::Int(1));
}

// =============================================================================
// 3. Record copy law (invariant 4)
// =============================================================================

/// For a record r: Copy(r) is a different identity but field-wise equal.
#[test]
fn record_copy_is_new_identity_equal_fields() {
    let ty = RecordType::new("TPair", [("A", "Integer"), ("B", "String")]);
    let original = RecordValue::new(ty, None, Some(&|f| match f.field_type.as_str() {
        "Integer" => Value::Int(0),
        _ => Value::string(""),
    }));
    original.borrow_mut().set_field("A", Value::Int(12));
    original.borrow_mut().set_field("B", Value::string("twelve"));

    let original = Value::Record(original);
    let copy = original.deep_copy();

    assert_ne!(original, copy, "copy must be a distinct identity");
    assert!(
        arith::values_equal(&original, &copy).unwrap(),
        "copy must be field-wise equal"
    );
}

/// Objects stored in record fields are shared by the copy, not cloned.
#[test]
fn record_copy_shares_contained_objects() {
    let class = ClassMetadata::new_ref("TShared");
    let object = ObjectInstance::new(&class, None);
    let ty = RecordType::new("THolder", [("Obj", "TShared")]);
    let record = RecordValue::new(ty, None, None);
    record.borrow_mut().set_field("Obj", Value::Object(object.clone()));

    let copy = record.borrow().deep_copy();
    match copy.borrow().get_field("Obj") {
        Some(Value::Object(shared)) => assert!(std::rc::Rc::ptr_eq(&shared, &object)),
        other => panic!("expected the shared object, got {other:?}"),
    }
}

/// Nested records are copied recursively — mutating the copy's inner
/// record leaves the original untouched.
#[test]
fn nested_records_copy_recursively() {
    let inner_ty = RecordType::new("TInner", [("N", "Integer")]);
    let outer_ty = RecordType::new("TOuter", [("Inner", "TInner")]);
    let inner = RecordValue::new(inner_ty, None, Some(&|_| Value::Int(1)));
    let outer = RecordValue::new(outer_ty, None, None);
    outer.borrow_mut().set_field("Inner", Value::Record(inner.clone()));

    let copy = outer.borrow().deep_copy();
    if let Some(Value::Record(copied_inner)) = copy.borrow().get_field("Inner") {
        copied_inner.borrow_mut().set_field("N", Value::Int(99));
    }
    assert_eq!(inner.borrow().get_field("N"), Some(Value::Int(1)));
}

// =============================================================================
// 4. Conversions
// =============================================================================

/// The documented conversion surface, end to end.
#[test]
fn conversion_surface() {
    assert_eq!(convert::convert_to(&Value::string("17"), "Integer").unwrap(), Value::Int(17));
    assert_eq!(
        convert::convert_to(&Value::Int(1), "BOOLEAN").unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        convert::convert_to(&Value::Float(1.25), "String").unwrap(),
        Value::string("1.25")
    );
    let err = convert::convert_to(&Value::string("abc"), "Integer").unwrap_err();
    assert!(err.is_conversion());
}

// =============================================================================
// 5. Pool statistics
// =============================================================================

/// The Integer/Float factories feed the pool counters, and the efficiency
/// ratio reflects reuse.
#[test]
fn pool_counters_track_factory_traffic() {
    let before = pool::pool_stats();
    let a = pool::int_value(1);
    let b = pool::float_value(2.0);
    pool::release_value(&a);
    pool::release_value(&b);
    let after = pool::pool_stats();

    assert!(after.int.gets >= before.int.gets + 1);
    assert!(after.int.puts >= before.int.puts + 1);
    assert!(after.float.gets >= before.float.gets + 1);
    assert!(after.float.puts >= before.float.puts + 1);
    assert_eq!(a, Value::Int(1));
    assert_eq!(b, Value::Float(2.0));
}
