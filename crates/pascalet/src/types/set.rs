//! Set type descriptors and set values.
//!
//! Storage is chosen by the set *type*, not by content: a bitmask covers
//! ordinal domains that fit 0..63, a hash map handles sparse or large
//! domains. Lazy inclusive ranges overlay both stores — `AddElement` and
//! `RemoveElement` touch only the primary store, while membership checks
//! search the ranges first. The canonical view of a set is the union of all
//! three layers, exposed sorted and de-duplicated by
//! [`SetValue::ordinals`].

use std::{cell::RefCell, fmt, rc::Rc};

use ahash::AHashSet;
use strum::Display;

use crate::types::enums::EnumType;

/// Shared handle to a set value.
pub type SetRef = Rc<RefCell<SetValue>>;

/// Primary storage layout for a set type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SetStorageKind {
    /// One bit per ordinal; fits domains inside 0..63.
    Bitmask,
    /// Hash set of ordinals; for sparse or large domains.
    Map,
}

/// Declared set type.
#[derive(Debug)]
pub struct SetType {
    /// Type name as written.
    pub name: String,
    /// The element enum type, when the set is over an enumeration.
    pub enum_type: Option<Rc<EnumType>>,
    /// Number of ordinals in the element domain.
    pub domain_size: usize,
    /// Primary storage layout, fixed at declaration.
    pub storage: SetStorageKind,
}

impl SetType {
    /// Creates a set type, picking the storage from the domain size:
    /// bitmask when the whole domain fits 0..63, map otherwise.
    pub fn new(name: impl Into<String>, enum_type: Option<Rc<EnumType>>, domain_size: usize) -> Rc<Self> {
        let storage = if domain_size <= 64 {
            SetStorageKind::Bitmask
        } else {
            SetStorageKind::Map
        };
        Rc::new(Self {
            name: name.into(),
            enum_type,
            domain_size,
            storage,
        })
    }

    /// Creates a set type over an enumeration, deriving the domain size
    /// from the enum's declared values.
    pub fn of_enum(name: impl Into<String>, enum_type: Rc<EnumType>) -> Rc<Self> {
        let domain_size = enum_type
            .max_ordinal()
            .map_or(0, |max| usize::try_from(max).unwrap_or(usize::MAX).saturating_add(1));
        Self::new(name, Some(enum_type), domain_size)
    }
}

/// An inclusive, direction-agnostic ordinal range (`Start <= End` or
/// `Start > End` both describe the same span).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub start: i64,
    pub end: i64,
}

impl IntRange {
    /// `(low, high)` with the endpoints ordered.
    #[must_use]
    pub fn bounds(self) -> (i64, i64) {
        if self.start <= self.end {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }

    /// Returns `true` when `ordinal` lies inside the range.
    #[must_use]
    pub fn contains(self, ordinal: i64) -> bool {
        let (low, high) = self.bounds();
        ordinal >= low && ordinal <= high
    }
}

/// A set value: primary store (bitmask or map, per the type) plus lazy
/// ranges.
#[derive(Debug)]
pub struct SetValue {
    set_type: Rc<SetType>,
    bits: u64,
    map: AHashSet<i64>,
    ranges: Vec<IntRange>,
}

impl SetValue {
    /// Creates an empty set of the given type.
    #[must_use]
    pub fn new(set_type: Rc<SetType>) -> SetRef {
        Rc::new(RefCell::new(Self {
            set_type,
            bits: 0,
            map: AHashSet::new(),
            ranges: Vec::new(),
        }))
    }

    /// Creates a set containing the given ordinals.
    #[must_use]
    pub fn from_ordinals(set_type: Rc<SetType>, ordinals: impl IntoIterator<Item = i64>) -> SetRef {
        let set = Self::new(set_type);
        for ord in ordinals {
            set.borrow_mut().add_element(ord);
        }
        set
    }

    /// The declared type.
    #[must_use]
    pub fn set_type(&self) -> &Rc<SetType> {
        &self.set_type
    }

    /// Adds an ordinal to the primary store. For bitmask storage an ordinal
    /// outside the type's domain (or outside 0..63) is a no-op.
    pub fn add_element(&mut self, ordinal: i64) {
        match self.set_type.storage {
            SetStorageKind::Bitmask => {
                if (0..64.min(self.set_type.domain_size as i64)).contains(&ordinal) {
                    self.bits |= 1 << ordinal;
                }
            }
            SetStorageKind::Map => {
                self.map.insert(ordinal);
            }
        }
    }

    /// Removes an ordinal from the primary store. Ordinals covered only by
    /// a lazy range are unaffected.
    pub fn remove_element(&mut self, ordinal: i64) {
        match self.set_type.storage {
            SetStorageKind::Bitmask => {
                if (0..64).contains(&ordinal) {
                    self.bits &= !(1 << ordinal);
                }
            }
            SetStorageKind::Map => {
                self.map.remove(&ordinal);
            }
        }
    }

    /// Overlays a lazy inclusive range.
    pub fn add_range(&mut self, start: i64, end: i64) {
        self.ranges.push(IntRange { start, end });
    }

    /// Membership test: the lazy ranges are searched first, then the
    /// primary store.
    #[must_use]
    pub fn has_element(&self, ordinal: i64) -> bool {
        if self.ranges.iter().any(|r| r.contains(ordinal)) {
            return true;
        }
        match self.set_type.storage {
            SetStorageKind::Bitmask => (0..64).contains(&ordinal) && self.bits & (1 << ordinal) != 0,
            SetStorageKind::Map => self.map.contains(&ordinal),
        }
    }

    /// The canonical view: every present ordinal from bitmask, map, and
    /// ranges, sorted ascending and de-duplicated.
    #[must_use]
    pub fn ordinals(&self) -> Vec<i64> {
        let mut all: Vec<i64> = match self.set_type.storage {
            SetStorageKind::Bitmask => (0..64).filter(|&b| self.bits & (1 << b) != 0).collect(),
            SetStorageKind::Map => self.map.iter().copied().collect(),
        };
        for range in &self.ranges {
            let (low, high) = range.bounds();
            all.extend(low..=high);
        }
        all.sort_unstable();
        all.dedup();
        all
    }

    /// Number of distinct present ordinals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordinals().len()
    }

    /// Returns `true` when no ordinal is present. Any lazy range covers at
    /// least one ordinal, so a set with ranges is never empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits == 0 && self.map.is_empty() && self.ranges.is_empty()
    }
}

impl fmt::Display for SetValue {
    /// Renders `[Red, Blue]` for enum-typed sets (value names ordered by
    /// ordinal) and `[0, 5, 9]` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, ordinal) in self.ordinals().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match self.set_type.enum_type.as_ref().and_then(|e| e.name_of_ordinal(ordinal)) {
                Some(name) => f.write_str(name)?,
                None => write!(f, "{ordinal}")?,
            }
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_type() -> Rc<SetType> {
        SetType::new("TSmallSet", None, 40)
    }

    fn large_type() -> Rc<SetType> {
        SetType::new("TLargeSet", None, 200)
    }

    #[test]
    fn storage_is_chosen_by_domain_size() {
        assert_eq!(small_type().storage, SetStorageKind::Bitmask);
        assert_eq!(large_type().storage, SetStorageKind::Map);
    }

    #[test]
    fn bitmask_add_outside_domain_is_noop() {
        let set = SetValue::new(small_type());
        set.borrow_mut().add_element(50);
        assert!(!set.borrow().has_element(50));
        set.borrow_mut().add_element(39);
        assert!(set.borrow().has_element(39));
    }

    #[test]
    fn map_handles_large_ordinals() {
        let set = SetValue::new(large_type());
        set.borrow_mut().add_element(150);
        assert!(set.borrow().has_element(150));
        set.borrow_mut().remove_element(150);
        assert!(!set.borrow().has_element(150));
    }

    #[test]
    fn ranges_overlay_the_primary_store() {
        let set = SetValue::new(small_type());
        set.borrow_mut().add_element(2);
        set.borrow_mut().add_range(10, 5);
        let set = set.borrow();
        assert!(set.has_element(7), "direction-agnostic range must match");
        assert!(set.has_element(2));
        assert_eq!(set.ordinals(), vec![2, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn remove_does_not_touch_ranges() {
        let set = SetValue::new(small_type());
        set.borrow_mut().add_range(1, 3);
        set.borrow_mut().remove_element(2);
        assert!(set.borrow().has_element(2));
    }

    #[test]
    fn membership_is_stable_under_unrelated_changes() {
        let set = SetValue::new(small_type());
        set.borrow_mut().add_element(7);
        set.borrow_mut().add_element(9);
        set.borrow_mut().remove_element(9);
        assert!(set.borrow().has_element(7));
    }

    #[test]
    fn enum_sets_display_value_names() {
        let colors = EnumType::new("TColor", [("Red", 0), ("Green", 1), ("Blue", 2)]);
        let ty = SetType::of_enum("TColors", colors);
        let set = SetValue::from_ordinals(ty, [2, 0]);
        assert_eq!(set.borrow().to_string(), "[Red, Blue]");
    }

    #[test]
    fn numeric_sets_display_ordinals() {
        let set = SetValue::from_ordinals(small_type(), [5, 0]);
        assert_eq!(set.borrow().to_string(), "[0, 5]");
    }
}
