//! The method registry.
//!
//! Methods register once at declaration time and receive a dense,
//! monotonically increasing [`MethodId`]; id 0 is reserved as invalid. The
//! registry is the only concurrent surface of the core besides the
//! destructor-callback slot: registrations take the write lock, lookups the
//! read lock, and an assigned id never changes or disappears for the life
//! of the registry (`clear` exists for tests only).

use std::sync::{
    RwLock,
    atomic::{AtomicU64, Ordering},
};
use std::sync::Arc;

use ahash::AHashMap;

use crate::{
    ident,
    meta::{MethodId, MethodMetadata},
};

/// Snapshot of registry statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Methods registered so far.
    pub registered: u64,
    /// `get` calls served.
    pub lookups: u64,
}

#[derive(Debug, Default)]
struct RegistryInner {
    /// Index = raw id. Slot 0 is the reserved invalid id and stays `None`.
    methods: Vec<Option<Arc<MethodMetadata>>>,
    /// Normalised method name to every id registered under it.
    by_name: AHashMap<String, Vec<MethodId>>,
}

/// Concurrent method registry with dense monotonic ids.
#[derive(Debug)]
pub struct MethodRegistry {
    inner: RwLock<RegistryInner>,
    lookups: AtomicU64,
}

impl Default for MethodRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MethodRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                methods: vec![None],
                by_name: AHashMap::new(),
            }),
            lookups: AtomicU64::new(0),
        }
    }

    /// Registers a method and returns its id. Ids are assigned densely in
    /// registration order, starting at 1.
    pub fn register(&self, metadata: MethodMetadata) -> MethodId {
        let metadata = Arc::new(metadata);
        let mut inner = self.inner.write().expect("method registry lock poisoned");
        let id = MethodId::new(inner.methods.len() as u32);
        let key = ident::normalize(&metadata.name);
        inner.methods.push(Some(metadata));
        inner.by_name.entry(key).or_default().push(id);
        id
    }

    /// Looks up a method by id — the hot path, under the read lock.
    #[must_use]
    pub fn get(&self, id: MethodId) -> Option<Arc<MethodMetadata>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        let inner = self.inner.read().expect("method registry lock poisoned");
        inner.methods.get(id.index() as usize)?.clone()
    }

    /// Every id registered under the (case-insensitive) name, in
    /// registration order — the overload index.
    #[must_use]
    pub fn lookup_name(&self, name: &str) -> Vec<MethodId> {
        let inner = self.inner.read().expect("method registry lock poisoned");
        inner.by_name.get(&ident::normalize(name)).cloned().unwrap_or_default()
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        let inner = self.inner.read().expect("method registry lock poisoned");
        inner.methods.len() - 1
    }

    /// Returns `true` when nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registry statistics.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            registered: self.len() as u64,
            lookups: self.lookups.load(Ordering::Relaxed),
        }
    }

    /// Drops every registration and resets the id sequence. Testing only —
    /// live [`MethodId`]s are invalidated.
    pub fn clear(&self) {
        let mut inner = self.inner.write().expect("method registry lock poisoned");
        inner.methods.clear();
        inner.methods.push(None);
        inner.by_name.clear();
        self.lookups.store(0, Ordering::Relaxed);
    }
}
