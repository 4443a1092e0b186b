//! Enumeration and subrange types.
//!
//! An enum value is `(type, value name, ordinal)`; its display form is the
//! ordinal, matching the language's default string coercion. A subrange is
//! an integer constrained to a declared `[low..high]` interval, checked on
//! every assignment.

use std::{fmt, rc::Rc};

use ahash::AHashMap;

use crate::{
    error::{RunError, RunResult},
    ident,
};

/// Declared enumeration type: the value names in ordinal order plus a
/// name-to-ordinal index.
#[derive(Debug)]
pub struct EnumType {
    /// Type name as written.
    pub name: String,
    /// `(value name, ordinal)` pairs, ordered by ordinal.
    values: Vec<(Rc<str>, i64)>,
    /// Normalised value name to position in `values`.
    by_name: AHashMap<String, usize>,
    /// Ordinal to position in `values`.
    by_ordinal: AHashMap<i64, usize>,
}

impl EnumType {
    /// Creates an enum type from `(name, ordinal)` pairs. The pairs are
    /// sorted by ordinal; explicit ordinals (`(one = 1, four = 4)`) are
    /// allowed to be sparse.
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = (impl Into<String>, i64)>) -> Rc<Self> {
        let mut values: Vec<(Rc<str>, i64)> = values
            .into_iter()
            .map(|(n, ord)| (Rc::from(n.into().as_str()), ord))
            .collect();
        values.sort_by_key(|(_, ord)| *ord);
        let mut by_name = AHashMap::with_capacity(values.len());
        let mut by_ordinal = AHashMap::with_capacity(values.len());
        for (idx, (value_name, ordinal)) in values.iter().enumerate() {
            by_name.insert(ident::normalize(value_name), idx);
            by_ordinal.insert(*ordinal, idx);
        }
        Rc::new(Self {
            name: name.into(),
            values,
            by_name,
            by_ordinal,
        })
    }

    /// The `(value name, ordinal)` pairs in ordinal order.
    #[must_use]
    pub fn values(&self) -> &[(Rc<str>, i64)] {
        &self.values
    }

    /// Number of declared values (the domain size for set storage choice).
    #[must_use]
    pub fn domain_size(&self) -> usize {
        self.values.len()
    }

    /// Highest declared ordinal, or `None` for an empty enum.
    #[must_use]
    pub fn max_ordinal(&self) -> Option<i64> {
        self.values.last().map(|(_, ord)| *ord)
    }

    /// Looks up a value by (case-insensitive) name.
    #[must_use]
    pub fn value_by_name(self: &Rc<Self>, name: &str) -> Option<EnumValue> {
        let idx = *self.by_name.get(&ident::normalize(name))?;
        let (value_name, ordinal) = &self.values[idx];
        Some(EnumValue {
            enum_type: self.clone(),
            name: value_name.clone(),
            ordinal: *ordinal,
        })
    }

    /// Looks up a value by ordinal.
    #[must_use]
    pub fn value_by_ordinal(self: &Rc<Self>, ordinal: i64) -> Option<EnumValue> {
        let idx = *self.by_ordinal.get(&ordinal)?;
        let (value_name, _) = &self.values[idx];
        Some(EnumValue {
            enum_type: self.clone(),
            name: value_name.clone(),
            ordinal,
        })
    }

    /// The declared name for an ordinal, if any.
    #[must_use]
    pub fn name_of_ordinal(&self, ordinal: i64) -> Option<&str> {
        self.by_ordinal.get(&ordinal).map(|&idx| &*self.values[idx].0)
    }
}

/// A value of an enumeration type.
#[derive(Debug, Clone)]
pub struct EnumValue {
    /// The declaring type.
    pub enum_type: Rc<EnumType>,
    /// Value name as declared.
    pub name: Rc<str>,
    /// The ordinal.
    pub ordinal: i64,
}

impl EnumValue {
    /// The declaring type's name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.enum_type.name
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal && ident::eq_ignore_case(&self.enum_type.name, &other.enum_type.name)
    }
}

impl fmt::Display for EnumValue {
    /// The default string coercion of an enum is its ordinal.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ordinal}", ordinal = self.ordinal)
    }
}

/// Declared subrange type: `type TDigit = 0..9;`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubrangeType {
    /// Type name as written.
    pub name: String,
    /// Inclusive lower bound.
    pub low: i64,
    /// Inclusive upper bound.
    pub high: i64,
}

impl SubrangeType {
    /// Creates a subrange type.
    pub fn new(name: impl Into<String>, low: i64, high: i64) -> Rc<Self> {
        Rc::new(Self {
            name: name.into(),
            low,
            high,
        })
    }

    /// Returns `true` when `value` lies inside the declared interval.
    #[must_use]
    pub fn contains(&self, value: i64) -> bool {
        value >= self.low && value <= self.high
    }
}

/// A bounds-checked integer value of a subrange type.
#[derive(Debug, Clone)]
pub struct SubrangeValue {
    /// The declaring type.
    pub subrange_type: Rc<SubrangeType>,
    value: i64,
}

impl SubrangeValue {
    /// Creates a subrange value, failing with a domain error when `value`
    /// is outside the declared interval.
    pub fn new(subrange_type: Rc<SubrangeType>, value: i64) -> RunResult<Self> {
        let mut this = Self {
            subrange_type,
            value: 0,
        };
        this.validate_and_set(value)?;
        Ok(this)
    }

    /// The current value.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Replaces the value after bounds-checking it against the declared
    /// interval.
    pub fn validate_and_set(&mut self, value: i64) -> RunResult<()> {
        if !self.subrange_type.contains(value) {
            return Err(RunError::arithmetic(format!(
                "value {value} out of range for {name} [{low}..{high}]",
                name = self.subrange_type.name,
                low = self.subrange_type.low,
                high = self.subrange_type.high,
            )));
        }
        self.value = value;
        Ok(())
    }
}

impl PartialEq for SubrangeValue {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Display for SubrangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{value}", value = self.value)
    }
}
