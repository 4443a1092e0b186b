//! Integer/Float value pool statistics.
//!
//! The original runtime drew Integer and Float values from a reset-on-put
//! object pool to cut allocations in hot arithmetic loops. In this core,
//! `Value::Int` and `Value::Float` are immediates stored inline in the tagged
//! sum, so there is no allocation to elide — the pool's *slot store* is
//! vestigial. Its observable surface is preserved: factory functions route
//! through the pool counters, `release_value` returns a slot, and the
//! statistics snapshot (allocs, gets, puts, efficiency ratio) behaves exactly
//! as before, so embedders instrumenting allocation pressure keep working.
//!
//! The counters are process-wide atomics initialised at module load. Releases
//! are optional — omitting them is always safe, and releasing a non-numeric
//! value is a no-op.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::value::Value;

/// Per-type pool counters. Relaxed ordering: the counters are statistics,
/// not synchronisation.
#[derive(Debug, Default)]
struct PoolCounters {
    allocs: AtomicU64,
    gets: AtomicU64,
    puts: AtomicU64,
    free: AtomicU64,
}

impl PoolCounters {
    fn get(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        // Reuse a released slot when one is available, otherwise count a
        // fresh allocation.
        if self
            .free
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_err()
        {
            self.allocs.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.free.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> PoolTypeStats {
        PoolTypeStats {
            allocs: self.allocs.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.allocs.store(0, Ordering::Relaxed);
        self.gets.store(0, Ordering::Relaxed);
        self.puts.store(0, Ordering::Relaxed);
        self.free.store(0, Ordering::Relaxed);
    }
}

static INT_POOL: PoolCounters = PoolCounters {
    allocs: AtomicU64::new(0),
    gets: AtomicU64::new(0),
    puts: AtomicU64::new(0),
    free: AtomicU64::new(0),
};

static FLOAT_POOL: PoolCounters = PoolCounters {
    allocs: AtomicU64::new(0),
    gets: AtomicU64::new(0),
    puts: AtomicU64::new(0),
    free: AtomicU64::new(0),
};

/// Counters for one pooled value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolTypeStats {
    /// Values created fresh (no released slot was available).
    pub allocs: u64,
    /// Values handed out by the factory.
    pub gets: u64,
    /// Values returned through `release_value`.
    pub puts: u64,
}

impl PoolTypeStats {
    /// Pool efficiency ratio `(gets - allocs) / gets`.
    ///
    /// Returns 0.0 before the first get.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            (self.gets - self.allocs) as f64 / self.gets as f64
        }
    }
}

/// Snapshot of both pools at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Integer pool counters.
    pub int: PoolTypeStats,
    /// Float pool counters.
    pub float: PoolTypeStats,
}

/// Creates an Integer value through the pool.
#[must_use]
pub fn int_value(n: i64) -> Value {
    INT_POOL.get();
    Value::Int(n)
}

/// Creates a Float value through the pool.
#[must_use]
pub fn float_value(x: f64) -> Value {
    FLOAT_POOL.get();
    Value::Float(x)
}

/// Returns a pooled value's slot. Optional; safe on any value (non-numeric
/// values are ignored).
pub fn release_value(value: &Value) {
    match value {
        Value::Int(_) => INT_POOL.put(),
        Value::Float(_) => FLOAT_POOL.put(),
        _ => {}
    }
}

/// Takes a snapshot of the pool statistics.
#[must_use]
pub fn pool_stats() -> PoolStats {
    PoolStats {
        int: INT_POOL.snapshot(),
        float: FLOAT_POOL.snapshot(),
    }
}

/// Resets all pool counters to zero. Testing only — the counters are global,
/// so concurrent tests observing them must serialise around this.
pub fn reset_pool_stats() {
    INT_POOL.reset();
    FLOAT_POOL.reset();
}

#[cfg(test)]
mod tests {
    use super::*;

    // The counters are process-wide and tests run in parallel threads, so
    // everything that asserts exact deltas lives in one sequential test.

    #[test]
    fn counters_track_gets_puts_and_reuse() {
        let before = pool_stats();

        let v = int_value(42);
        assert_eq!(v, Value::Int(42));
        let after_get = pool_stats();
        assert_eq!(after_get.int.gets, before.int.gets + 1);

        release_value(&v);
        let after_put = pool_stats();
        assert_eq!(after_put.int.puts, before.int.puts + 1);

        // The released slot satisfies the next get without a fresh alloc.
        let allocs_before_reuse = pool_stats().int.allocs;
        let _w = int_value(7);
        assert_eq!(pool_stats().int.allocs, allocs_before_reuse);

        // Non-numeric releases are ignored.
        release_value(&Value::Bool(true));
        release_value(&Value::Null);
        assert_eq!(pool_stats().int.puts, after_put.int.puts);
        assert_eq!(pool_stats().float.puts, before.float.puts);
    }

    #[test]
    fn efficiency_is_zero_before_first_get() {
        let stats = PoolTypeStats {
            allocs: 0,
            gets: 0,
            puts: 0,
        };
        assert!((stats.efficiency() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn efficiency_counts_reuse() {
        let stats = PoolTypeStats {
            allocs: 25,
            gets: 100,
            puts: 80,
        };
        assert!((stats.efficiency() - 0.75).abs() < 1e-9);
    }
}
