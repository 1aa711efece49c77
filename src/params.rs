//! Ordered parameter mapping shared by matching and construction.
//!
//! Parameters are loosely typed: values are [`serde_json::Value`]
//! scalars (`String`, `Number`, `Bool`). `Null` marks a parameter that
//! is known to the route but absent from the URL. Arrays and objects
//! are non-scalar; the broker treats them as the `*` cache bucket and
//! construction skips them wherever a string is required.
//!
//! The mapping preserves insertion order, which drives the order of
//! emitted query-string entries, and is backed by a `SmallVec` so that
//! routes with few parameters never touch the heap.

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use smallvec::SmallVec;

/// Maximum number of parameters before heap allocation.
///
/// Most route masks carry a handful of placeholders
/// (e.g. `<presenter>/<action>[/<id>]`), so the backing vector stays on
/// the stack in the common case.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Ordered mapping from parameter name to scalar value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: SmallVec<[(String, Value); MAX_INLINE_PARAMS]>,
}

impl Params {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from `(name, value)` pairs, preserving order.
    pub fn from_pairs<N, I>(pairs: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Value)>,
    {
        let mut params = Self::new();
        for (name, value) in pairs {
            params.insert(name, value);
        }
        params
    }

    /// Look up a value by name.
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    /// Look up a string scalar by name.
    #[inline]
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Insert a value, replacing in place when the name already exists.
    ///
    /// Replacing in place keeps iteration order stable, so a filter
    /// that rewrites a parameter does not move it to the end of the
    /// emitted query string.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Remove a parameter, returning its value if present.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(index).1)
    }

    /// Whether the mapping has an entry for `name` (including `Null`).
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the mapping is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<N: Into<String>> FromIterator<(N, Value)> for Params {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl IntoIterator for Params {
    type Item = (String, Value);
    type IntoIter = smallvec::IntoIter<[(String, Value); MAX_INLINE_PARAMS]>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Params {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Whether a value is a scalar (string, number or bool).
#[inline]
#[must_use]
pub fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

/// Render a scalar as the string that appears in a URL.
///
/// Returns `None` for `Null` and for non-scalar values.
#[must_use]
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
