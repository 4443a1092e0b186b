//! Jensen's Device through lazy thunks and var-parameter references.
//!
//! `sum(var i; lo, hi; lazy term)` with `term = 1.0/i` must re-evaluate
//! the term on every iteration against the *caller's* `i`, so
//! `sum(i, 1, 100, 1.0/i)` computes the 100th harmonic number. The runtime
//! pieces under test: [`ReferenceValue`] writing through to the caller's
//! slot and [`LazyThunk`] re-running its callback on each access (no
//! caching).

use std::{cell::RefCell, rc::Rc};

use pascalet::{Environment, LazyThunk, ReferenceValue, RunError, RunResult, Value};

/// The callee: sums `term` for i := lo..hi, writing i through the var
/// reference before each evaluation.
fn sum(i: &ReferenceValue, lo: i64, hi: i64, term: &LazyThunk) -> RunResult<f64> {
    let mut total = 0.0;
    for k in lo..=hi {
        i.assign(Value::Int(k))?;
        match term.evaluate()? {
            Value::Float(x) => total += x,
            other => {
                return Err(RunError::type_error(format!(
                    "term evaluated to {tag}, expected FLOAT",
                    tag = other.type_name()
                )));
            }
        }
    }
    Ok(total)
}

/// Wires the caller's environment: a variable `i`, a var-reference over
/// it, and the lazy term `1.0 / i` closing over the same environment.
fn caller_wiring() -> (Rc<RefCell<pascalet::Environment>>, Rc<ReferenceValue>, Rc<LazyThunk>) {
    let env = Environment::new();
    env.borrow_mut().define("i", Value::Int(0));

    let read_env = env.clone();
    let write_env = env.clone();
    let reference = ReferenceValue::new(
        "i",
        Rc::new(move || {
            read_env
                .borrow()
                .get("i")
                .ok_or_else(|| RunError::type_error("undefined variable: i"))
        }),
        Rc::new(move |value| write_env.borrow_mut().set("i", value)),
    );

    let term_env = env.clone();
    let term = LazyThunk::new("1.0 / i", Rc::new(move || {
        let i = term_env
            .borrow()
            .get("i")
            .ok_or_else(|| RunError::type_error("undefined variable: i"))?;
        pascalet::arith::divide(&Value::Float(1.0), &i)
    }));

    (env, reference, term)
}

// =============================================================================
// 1. The harmonic sum
// =============================================================================

/// `sum(i, 1, 100, 1.0/i)` matches the mathematically computed harmonic
/// number to five decimals.
#[test]
fn harmonic_sum_to_five_decimals() {
    let (_env, reference, term) = caller_wiring();
    let total = sum(&reference, 1, 100, &term).unwrap();

    let expected: f64 = (1..=100).map(|k| 1.0 / k as f64).sum();
    assert!(
        (total - expected).abs() < 1e-5,
        "harmonic sum mismatch: got {total}, expected {expected}"
    );
    // H(100) ~= 5.18738
    assert!((total - 5.18738).abs() < 1e-5, "got {total}");
}

// =============================================================================
// 2. The mechanism, observed from the caller
// =============================================================================

/// The callee's writes through the var reference are visible in the
/// caller's environment after the call.
#[test]
fn var_parameter_mutates_the_caller_slot() {
    let (env, reference, term) = caller_wiring();
    sum(&reference, 1, 5, &term).unwrap();
    assert_eq!(
        env.borrow().get("i"),
        Some(Value::Int(5)),
        "loop variable left at its final value in the caller's scope"
    );
}

/// A thunk is genuinely lazy: nothing is evaluated until the callee asks.
#[test]
fn term_is_not_evaluated_before_first_access() {
    let hits = Rc::new(std::cell::Cell::new(0));
    let counted = hits.clone();
    let term = LazyThunk::new("probe", Rc::new(move || {
        counted.set(counted.get() + 1);
        Ok(Value::Float(0.0))
    }));
    assert_eq!(hits.get(), 0, "construction must not evaluate");
    term.evaluate().unwrap();
    term.evaluate().unwrap();
    assert_eq!(hits.get(), 2, "each access re-evaluates");
}
