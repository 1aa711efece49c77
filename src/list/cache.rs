//! Construction-time dispatch cache.
//!
//! `construct_url` would otherwise probe every child in order. The
//! cache picks one *cache key* - the constant-parameter name with the
//! most distinct pinned values across children - and buckets children
//! by the value they pin it to. Construction then only probes the
//! bucket matching `params[cache_key]`, falling back to the `*`
//! bucket when the value is absent, non-scalar or unknown.
//!
//! Buckets are built in two passes over the insertion order: the full
//! value set is determined first, then every child is appended to each
//! bucket it belongs to, so each concrete bucket is a superset of `*`
//! with the global insertion order preserved.

use super::core::Entry;
use crate::params::{is_scalar, Params};
use serde_json::Value;

pub(crate) struct DispatchCache {
    pub(crate) key: Option<String>,
    buckets: Vec<(Value, Vec<usize>)>,
    star: Vec<usize>,
}

impl DispatchCache {
    pub(crate) fn build(entries: &[Entry]) -> Self {
        // candidate names come from two-way children only
        let mut candidates: Vec<(String, Vec<Value>)> = Vec::new();
        for entry in entries.iter().filter(|entry| !entry.is_one_way()) {
            for (name, value) in entry.router().constant_parameters().iter() {
                if !is_scalar(value) {
                    continue;
                }
                match candidates.iter_mut().find(|(n, _)| n.as_str() == name) {
                    Some((_, values)) => {
                        if !values.contains(value) {
                            values.push(value.clone());
                        }
                    }
                    None => candidates.push((name.to_string(), vec![value.clone()])),
                }
            }
        }

        // most distinct values wins; ties keep the earliest name
        let mut best: Option<&(String, Vec<Value>)> = None;
        for candidate in &candidates {
            if best.map_or(true, |b| candidate.1.len() > b.1.len()) {
                best = Some(candidate);
            }
        }
        let Some(key) = best.map(|(name, _)| name.clone()) else {
            return Self {
                key: None,
                buckets: Vec::new(),
                star: (0..entries.len()).collect(),
            };
        };

        // full value set across all children, one-way included, so a
        // construction-only route pinning an unseen value still lands
        // in a reachable bucket
        let mut buckets: Vec<(Value, Vec<usize>)> = Vec::new();
        for entry in entries {
            if let Some(value) = pinned(entry, &key) {
                if !buckets.iter().any(|(v, _)| v == &value) {
                    buckets.push((value, Vec::new()));
                }
            }
        }

        let mut star = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            match pinned(entry, &key) {
                Some(value) => {
                    if let Some((_, bucket)) = buckets.iter_mut().find(|(v, _)| v == &value) {
                        bucket.push(index);
                    }
                }
                None => {
                    star.push(index);
                    for (_, bucket) in &mut buckets {
                        bucket.push(index);
                    }
                }
            }
        }

        Self {
            key: Some(key),
            buckets,
            star,
        }
    }

    /// Child indices to probe for this parameter mapping.
    pub(crate) fn bucket_for(&self, params: &Params) -> &[usize] {
        let Some(key) = &self.key else {
            return &self.star;
        };
        match params.get(key) {
            Some(value) if is_scalar(value) => self
                .buckets
                .iter()
                .find(|(v, _)| v == value)
                .map(|(_, bucket)| bucket.as_slice())
                .unwrap_or(&self.star),
            _ => &self.star,
        }
    }

    pub(crate) fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

fn pinned(entry: &Entry, key: &str) -> Option<Value> {
    let constants = entry.router().constant_parameters();
    let value = constants.get(key)?;
    if is_scalar(value) {
        Some(value.clone())
    } else {
        None
    }
}
