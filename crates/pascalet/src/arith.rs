//! Checked arithmetic, equality, and ordering over values.
//!
//! Numeric operations prefer integer arithmetic when *both* operands are
//! integer variants; otherwise the operands widen to float. Division `/`
//! always widens; `div`/`mod` are integer-only. Integer overflow is
//! detected and reported, never silently wrapped.
//!
//! Equality is semantic (records compare field-wise, arrays element-wise,
//! sets by their canonical ordinal view); ordering is defined for numbers,
//! strings (byte-wise), booleans (`false < true`), and same-typed enums,
//! and fails with a typed [`ComparisonError`](crate::error::RunError::Comparison)
//! everywhere else.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::{
    error::{RunError, RunResult},
    value::Value,
};

/// Recursion allowance for equality over nested containers. Deeper graphs
/// (necessarily cyclic through shared handles) compare unequal.
const MAX_EQ_DEPTH: usize = crate::limits::DEFAULT_MAX_DATA_DEPTH;

fn binary_type_error(op: &str, left: &Value, right: &Value) -> RunError {
    RunError::type_error(format!(
        "operator '{op}' not applicable to {l} and {r}",
        l = left.type_name(),
        r = right.type_name()
    ))
}

/// Addition. Integer when both operands are integer variants (checked),
/// float otherwise; strings concatenate.
pub fn add(left: &Value, right: &Value) -> RunResult<Value> {
    if let (Value::Str(a), Value::Str(b)) = (left, right) {
        let mut s = String::with_capacity(a.len() + b.len());
        s.push_str(a);
        s.push_str(b);
        return Ok(Value::Str(Rc::from(s.as_str())));
    }
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return a
            .checked_add(b)
            .map(Value::Int)
            .ok_or_else(|| RunError::arithmetic("integer overflow in addition"));
    }
    if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
        return Ok(Value::Float(a + b));
    }
    Err(binary_type_error("+", left, right))
}

/// Subtraction. Integer when both operands are integer variants (checked),
/// float otherwise.
pub fn sub(left: &Value, right: &Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return a
            .checked_sub(b)
            .map(Value::Int)
            .ok_or_else(|| RunError::arithmetic("integer overflow in subtraction"));
    }
    if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
        return Ok(Value::Float(a - b));
    }
    Err(binary_type_error("-", left, right))
}

/// Multiplication. Integer when both operands are integer variants
/// (checked), float otherwise.
pub fn mul(left: &Value, right: &Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
        return a
            .checked_mul(b)
            .map(Value::Int)
            .ok_or_else(|| RunError::arithmetic("integer overflow in multiplication"));
    }
    if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
        return Ok(Value::Float(a * b));
    }
    Err(binary_type_error("*", left, right))
}

/// Division `/` — always widens to float; thereafter IEEE semantics apply
/// (`1/0` is INF, `0/0` is NaN).
pub fn divide(left: &Value, right: &Value) -> RunResult<Value> {
    if let (Some(a), Some(b)) = (left.as_float(), right.as_float()) {
        return Ok(Value::Float(a / b));
    }
    Err(binary_type_error("/", left, right))
}

/// Integer division `div`. Both operands must be integer variants; a zero
/// divisor fails.
pub fn int_div(left: &Value, right: &Value) -> RunResult<Value> {
    let (Some(a), Some(b)) = (left.as_int(), right.as_int()) else {
        return Err(binary_type_error("div", left, right));
    };
    if b == 0 {
        return Err(RunError::arithmetic("division by zero"));
    }
    a.checked_div(b)
        .map(Value::Int)
        .ok_or_else(|| RunError::arithmetic("integer overflow in division"))
}

/// Integer modulo `mod`. Both operands must be integer variants; a zero
/// divisor fails. Truncated semantics: the result takes the dividend's
/// sign.
pub fn int_mod(left: &Value, right: &Value) -> RunResult<Value> {
    let (Some(a), Some(b)) = (left.as_int(), right.as_int()) else {
        return Err(binary_type_error("mod", left, right));
    };
    if b == 0 {
        return Err(RunError::arithmetic("division by zero"));
    }
    a.checked_rem(b)
        .map(Value::Int)
        .ok_or_else(|| RunError::arithmetic("integer overflow in modulo"))
}

/// Unary negation.
pub fn negate(value: &Value) -> RunResult<Value> {
    if let Value::Float(x) = value {
        return Ok(Value::Float(-x));
    }
    if let Some(n) = value.as_int() {
        return n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| RunError::arithmetic("integer overflow in negation"));
    }
    Err(RunError::type_error(format!(
        "operator '-' not applicable to {tag}",
        tag = value.type_name()
    )))
}

/// Semantic equality. Variants unwrap first; numbers compare across
/// int/float; records compare field-wise, arrays element-wise, sets by
/// ordinals; reference types compare by identity. Values of unrelated
/// kinds compare unequal rather than failing.
pub fn values_equal(left: &Value, right: &Value) -> RunResult<bool> {
    values_equal_at(left, right, 0)
}

fn values_equal_at(left: &Value, right: &Value, depth: usize) -> RunResult<bool> {
    if depth >= MAX_EQ_DEPTH {
        return Ok(false);
    }
    // Variants compare through their payloads.
    if matches!(left, Value::Variant(_)) || matches!(right, Value::Variant(_)) {
        return values_equal_at(&left.unwrap_variant(), &right.unwrap_variant(), depth + 1);
    }

    let result = match (left, right) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
        (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
        (Value::Subrange(_), _) | (_, Value::Subrange(_)) => {
            match (left.as_float(), right.as_float()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Nil(_), Value::Nil(_)) => true,
        (Value::Nil(_), Value::Object(_) | Value::Interface(_)) => false,
        (Value::Object(_) | Value::Interface(_), Value::Nil(_)) => false,
        (Value::Null, Value::Null) | (Value::Unassigned, Value::Unassigned) => true,
        (Value::Enum(a), Value::Enum(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        (Value::Interface(a), Value::Interface(b)) => Rc::ptr_eq(a.object(), b.object()),
        (Value::Json(a), Value::Json(b)) => a == b,
        (Value::FuncPtr(a), Value::FuncPtr(b)) => Rc::ptr_eq(a, b),
        (Value::Set(a), Value::Set(b)) => {
            if Rc::ptr_eq(a, b) {
                true
            } else {
                a.borrow().ordinals() == b.borrow().ordinals()
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            if Rc::ptr_eq(a, b) {
                true
            } else {
                let a = a.borrow();
                let b = b.borrow();
                if a.len() != b.len() {
                    false
                } else {
                    let mut all = true;
                    for (x, y) in a.elements().iter().zip(b.elements()) {
                        if !values_equal_at(x, y, depth + 1)? {
                            all = false;
                            break;
                        }
                    }
                    all
                }
            }
        }
        (Value::Record(a), Value::Record(b)) => {
            if Rc::ptr_eq(a, b) {
                true
            } else {
                let a = a.borrow();
                let b = b.borrow();
                let mut all = a.fields().count() == b.fields().count();
                if all {
                    for (name, x) in a.fields() {
                        match b.get_field(name) {
                            Some(y) if values_equal_at(x, &y, depth + 1)? => {}
                            _ => {
                                all = false;
                                break;
                            }
                        }
                    }
                }
                all
            }
        }
        _ => false,
    };
    Ok(result)
}

/// Total order where one is defined: numbers (cross int/float), strings
/// (byte-wise), booleans (`false < true`), same-typed enums by ordinal.
/// Anything else is a comparison error.
pub fn compare_values(left: &Value, right: &Value) -> RunResult<Ordering> {
    // Variants order through their payloads.
    if matches!(left, Value::Variant(_)) || matches!(right, Value::Variant(_)) {
        return compare_values(&left.unwrap_variant(), &right.unwrap_variant());
    }

    let fail = || RunError::comparison(left.type_name(), right.type_name(), "ordering");

    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
        (Value::Enum(a), Value::Enum(b)) => {
            if crate::ident::eq_ignore_case(a.type_name(), b.type_name()) {
                Ok(a.ordinal.cmp(&b.ordinal))
            } else {
                Err(fail())
            }
        }
        _ => {
            if let (Some(a), Some(b)) = (left.as_int(), right.as_int()) {
                return Ok(a.cmp(&b));
            }
            match (left.as_float(), right.as_float()) {
                (Some(a), Some(b)) => a.partial_cmp(&b).ok_or_else(fail),
                _ => Err(fail()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordType, RecordValue};

    #[test]
    fn integer_addition_overflow_is_detected() {
        let err = add(&Value::Int(i64::MAX), &Value::Int(1)).unwrap_err();
        assert_eq!(err, RunError::arithmetic("integer overflow in addition"));
        let err = sub(&Value::Int(i64::MIN), &Value::Int(1)).unwrap_err();
        assert_eq!(err, RunError::arithmetic("integer overflow in subtraction"));
        let err = mul(&Value::Int(i64::MAX / 2 + 1), &Value::Int(2)).unwrap_err();
        assert_eq!(err, RunError::arithmetic("integer overflow in multiplication"));
    }

    #[test]
    fn integer_path_preferred_when_both_are_integers() {
        assert_eq!(add(&Value::Int(2), &Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(
            add(&Value::Int(2), &Value::Float(0.5)).unwrap(),
            Value::Float(2.5),
            "mixed operands widen to float"
        );
    }

    #[test]
    fn slash_always_widens() {
        assert_eq!(divide(&Value::Int(3), &Value::Int(2)).unwrap(), Value::Float(1.5));
        let inf = divide(&Value::Float(1.0), &Value::Float(0.0)).unwrap();
        assert_eq!(inf, Value::Float(f64::INFINITY));
    }

    #[test]
    fn div_and_mod_reject_zero() {
        assert_eq!(
            int_div(&Value::Int(7), &Value::Int(0)).unwrap_err(),
            RunError::arithmetic("division by zero")
        );
        assert_eq!(
            int_mod(&Value::Int(7), &Value::Int(0)).unwrap_err(),
            RunError::arithmetic("division by zero")
        );
        assert_eq!(int_div(&Value::Int(7), &Value::Int(2)).unwrap(), Value::Int(3));
        assert_eq!(int_mod(&Value::Int(-7), &Value::Int(2)).unwrap(), Value::Int(-1));
    }

    #[test]
    fn div_rejects_float_operands() {
        assert!(int_div(&Value::Float(7.0), &Value::Int(2)).unwrap_err().is_type());
    }

    #[test]
    fn record_equality_is_field_wise() {
        let ty = RecordType::new("TPoint", [("X", "Integer"), ("Y", "Integer")]);
        let a = RecordValue::new(ty.clone(), None, Some(&|_| Value::Int(0)));
        a.borrow_mut().set_field("X", Value::Int(4));
        let b = a.borrow().deep_copy();
        assert!(values_equal(&Value::Record(a.clone()), &Value::Record(b.clone())).unwrap());
        b.borrow_mut().set_field("Y", Value::Int(9));
        assert!(!values_equal(&Value::Record(a), &Value::Record(b)).unwrap());
    }

    #[test]
    fn ordering_of_unrelated_kinds_fails() {
        let err = compare_values(&Value::Int(1), &Value::string("1")).unwrap_err();
        assert!(err.is_comparison());
    }

    #[test]
    fn string_ordering_is_byte_wise() {
        assert_eq!(
            compare_values(&Value::string("abc"), &Value::string("abd")).unwrap(),
            Ordering::Less
        );
    }

    #[test]
    fn variant_operands_unwrap() {
        let boxed = Value::Int(40).box_variant();
        assert_eq!(add(&boxed, &Value::Int(2)).unwrap(), Value::Int(42));
        assert!(values_equal(&boxed, &Value::Int(40)).unwrap());
    }
}
