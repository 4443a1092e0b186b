//! Array type descriptors and array values.
//!
//! Static arrays are pre-sized at construction (optionally through an
//! element initialiser callback); dynamic arrays start empty and are grown
//! by `SetLength`-style helpers outside the core. Indexing is adjusted by
//! the declared low bound; out-of-range access reports an
//! [`IndexError`](crate::error::RunError::Index) citing the valid bounds.

use std::{cell::RefCell, cmp::Ordering, rc::Rc};

use crate::{
    arith,
    error::{RunError, RunResult},
    value::Value,
};

/// Shared handle to an array value.
pub type ArrayRef = Rc<RefCell<ArrayValue>>;

/// Declared array type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayType {
    /// Element type name.
    pub element_type: String,
    /// Declared low bound (0 for dynamic arrays).
    pub low_bound: i64,
    /// `true` for dynamic arrays (empty at construction, growable).
    pub is_dynamic: bool,
    /// Element count for static arrays; `None` for dynamic.
    pub size: Option<usize>,
}

impl ArrayType {
    /// Creates a dynamic array type (low bound 0).
    pub fn dynamic(element_type: impl Into<String>) -> Rc<Self> {
        Rc::new(Self {
            element_type: element_type.into(),
            low_bound: 0,
            is_dynamic: true,
            size: None,
        })
    }

    /// Creates a static array type `array[low..high] of T`.
    pub fn fixed(element_type: impl Into<String>, low_bound: i64, size: usize) -> Rc<Self> {
        Rc::new(Self {
            element_type: element_type.into(),
            low_bound,
            is_dynamic: false,
            size: Some(size),
        })
    }
}

/// An ordered sequence of values with a declared [`ArrayType`].
#[derive(Debug)]
pub struct ArrayValue {
    array_type: Rc<ArrayType>,
    elements: Vec<Value>,
}

impl ArrayValue {
    /// Creates an empty dynamic array of the given type.
    #[must_use]
    pub fn new_dynamic(array_type: Rc<ArrayType>) -> ArrayRef {
        Rc::new(RefCell::new(Self {
            array_type,
            elements: Vec::new(),
        }))
    }

    /// Creates a static array, pre-sized from the type. When an initialiser
    /// is given it is called once per index; otherwise every slot starts as
    /// nil and the caller is responsible for zero-filling.
    #[must_use]
    pub fn new_static(array_type: Rc<ArrayType>, init: Option<&dyn Fn(usize) -> Value>) -> ArrayRef {
        let size = array_type.size.unwrap_or(0);
        let elements = match init {
            Some(init) => (0..size).map(init).collect(),
            None => vec![Value::nil(); size],
        };
        Rc::new(RefCell::new(Self {
            array_type,
            elements,
        }))
    }

    /// Creates an array from existing elements (array literals).
    #[must_use]
    pub fn from_elements(array_type: Rc<ArrayType>, elements: Vec<Value>) -> ArrayRef {
        Rc::new(RefCell::new(Self {
            array_type,
            elements,
        }))
    }

    /// The declared type.
    #[must_use]
    pub fn array_type(&self) -> &Rc<ArrayType> {
        &self.array_type
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` for an empty array.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Declared low bound.
    #[must_use]
    pub fn low_bound(&self) -> i64 {
        self.array_type.low_bound
    }

    /// Highest valid index (`low_bound + len - 1`).
    #[must_use]
    pub fn high_bound(&self) -> i64 {
        self.array_type.low_bound + self.elements.len() as i64 - 1
    }

    /// The elements, in order.
    #[must_use]
    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    /// Mutable access to the elements (used by `SetLength`-style helpers).
    pub fn elements_mut(&mut self) -> &mut Vec<Value> {
        &mut self.elements
    }

    fn offset(&self, index: i64) -> RunResult<usize> {
        let off = index - self.array_type.low_bound;
        if off < 0 || off >= self.elements.len() as i64 {
            return Err(RunError::index(
                index,
                self.array_type.low_bound,
                self.high_bound(),
                "array",
            ));
        }
        Ok(off as usize)
    }

    /// Reads the element at a declared-bound-relative index.
    pub fn get(&self, index: i64) -> RunResult<Value> {
        Ok(self.elements[self.offset(index)?].clone())
    }

    /// Writes the element at a declared-bound-relative index.
    pub fn set(&mut self, index: i64, value: Value) -> RunResult<()> {
        let off = self.offset(index)?;
        self.elements[off] = value;
        Ok(())
    }

    /// Appends an element (dynamic arrays).
    pub fn push(&mut self, value: Value) {
        self.elements.push(value);
    }

    /// Shallow copy: a new array with cloned element handles, sharing the
    /// [`ArrayType`].
    #[must_use]
    pub fn copy(&self) -> ArrayRef {
        Rc::new(RefCell::new(Self {
            array_type: self.array_type.clone(),
            elements: self.elements.clone(),
        }))
    }

    /// Finds the first element equal to `value` at or after `start_index`
    /// (declared-bound-relative). Returns the matching index, or -1 when
    /// `start_index` is out of range or nothing matches.
    #[must_use]
    pub fn index_of(&self, value: &Value, start_index: i64) -> i64 {
        let start = start_index - self.array_type.low_bound;
        if start < 0 || start >= self.elements.len() as i64 {
            return -1;
        }
        for (pos, element) in self.elements.iter().enumerate().skip(start as usize) {
            if arith::values_equal(element, value).unwrap_or(false) {
                return pos as i64 + self.array_type.low_bound;
            }
        }
        -1
    }

    /// Reverses the elements in place.
    pub fn reverse(&mut self) {
        self.elements.reverse();
    }

    /// Sorts the elements in place, dispatching on the type of the first
    /// element (Integer, Float, String, or Boolean — booleans order
    /// `false < true`). Heterogeneous or unordered arrays are left
    /// untouched.
    pub fn sort(&mut self) {
        match self.elements.first() {
            Some(Value::Int(_)) => {
                if self.elements.iter().all(|v| matches!(v, Value::Int(_))) {
                    self.elements.sort_by_key(|v| match v {
                        Value::Int(n) => *n,
                        _ => unreachable!(),
                    });
                }
            }
            Some(Value::Float(_)) => {
                if self.elements.iter().all(|v| matches!(v, Value::Float(_))) {
                    self.elements.sort_by(|a, b| match (a, b) {
                        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
                        _ => unreachable!(),
                    });
                }
            }
            Some(Value::Str(_)) => {
                if self.elements.iter().all(|v| matches!(v, Value::Str(_))) {
                    self.elements.sort_by(|a, b| match (a, b) {
                        (Value::Str(x), Value::Str(y)) => x.cmp(y),
                        _ => unreachable!(),
                    });
                }
            }
            Some(Value::Bool(_)) => {
                if self.elements.iter().all(|v| matches!(v, Value::Bool(_))) {
                    self.elements.sort_by_key(|v| match v {
                        Value::Bool(b) => *b,
                        _ => unreachable!(),
                    });
                }
            }
            _ => {}
        }
    }

    /// Copies the half-open range `[start_idx, end_idx)` (declared-bound-
    /// relative) into a new array sharing the [`ArrayType`]. The bounds are
    /// clamped to `[0..len]`, so any input yields a (possibly empty) array.
    #[must_use]
    pub fn slice(&self, start_idx: i64, end_idx: i64) -> ArrayRef {
        let len = self.elements.len() as i64;
        let start = (start_idx - self.array_type.low_bound).clamp(0, len) as usize;
        let end = (end_idx - self.array_type.low_bound).clamp(0, len) as usize;
        let elements = if start < end {
            self.elements[start..end].to_vec()
        } else {
            Vec::new()
        };
        Rc::new(RefCell::new(Self {
            array_type: self.array_type.clone(),
            elements,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> ArrayRef {
        ArrayValue::from_elements(
            ArrayType::dynamic("Integer"),
            values.iter().map(|&n| Value::Int(n)).collect(),
        )
    }

    #[test]
    fn low_bound_adjusts_indexing() {
        let ty = ArrayType::fixed("Integer", 5, 3);
        let arr = ArrayValue::new_static(ty, Some(&|i| Value::Int(i as i64 * 10)));
        let arr = arr.borrow();
        assert_eq!(arr.get(5).unwrap(), Value::Int(0));
        assert_eq!(arr.get(7).unwrap(), Value::Int(20));
        let err = arr.get(8).unwrap_err();
        assert_eq!(err, RunError::index(8, 5, 7, "array"));
    }

    #[test]
    fn static_without_init_is_nil_filled() {
        let arr = ArrayValue::new_static(ArrayType::fixed("Integer", 0, 2), None);
        assert!(arr.borrow().get(0).unwrap().is_nil());
    }

    #[test]
    fn index_of_rejects_bad_start() {
        let arr = ints(&[1, 2, 3, 2]);
        let arr = arr.borrow();
        assert_eq!(arr.index_of(&Value::Int(2), 0), 1);
        assert_eq!(arr.index_of(&Value::Int(2), 2), 3);
        assert_eq!(arr.index_of(&Value::Int(9), 0), -1);
        assert_eq!(arr.index_of(&Value::Int(1), 99), -1);
        assert_eq!(arr.index_of(&Value::Int(1), -1), -1);
    }

    #[test]
    fn sort_dispatches_and_skips_heterogeneous() {
        let arr = ints(&[3, 1, 2]);
        arr.borrow_mut().sort();
        assert_eq!(
            arr.borrow().elements(),
            &[Value::Int(1), Value::Int(2), Value::Int(3)]
        );

        let mixed = ArrayValue::from_elements(
            ArrayType::dynamic("Variant"),
            vec![Value::Int(3), Value::Str("a".into())],
        );
        mixed.borrow_mut().sort();
        assert_eq!(
            mixed.borrow().elements(),
            &[Value::Int(3), Value::Str("a".into())],
            "heterogeneous arrays stay unsorted"
        );
    }

    #[test]
    fn booleans_sort_false_first() {
        let arr = ArrayValue::from_elements(
            ArrayType::dynamic("Boolean"),
            vec![Value::Bool(true), Value::Bool(false), Value::Bool(true)],
        );
        arr.borrow_mut().sort();
        assert_eq!(
            arr.borrow().elements(),
            &[Value::Bool(false), Value::Bool(true), Value::Bool(true)]
        );
    }

    #[test]
    fn slice_clamps_and_shares_type() {
        let arr = ints(&[10, 20, 30, 40]);
        let arr = arr.borrow();
        let mid = arr.slice(1, 3);
        assert_eq!(mid.borrow().elements(), &[Value::Int(20), Value::Int(30)]);
        assert!(Rc::ptr_eq(mid.borrow().array_type(), arr.array_type()));

        let clamped = arr.slice(-5, 99);
        assert_eq!(clamped.borrow().len(), 4);
        let empty = arr.slice(3, 1);
        assert!(empty.borrow().is_empty());
    }
}
