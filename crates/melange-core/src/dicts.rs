//! Helpers over plain key/value mappings.
//!
//! Soft helpers (`filter`, `merge`, `zip`, `rename`) never fail on a missing
//! key: they omit or pad. Hard helpers (`unzip`, `groupby`, `clean_dict`)
//! return [`MelangeError::MissingKey`] when a requested key is absent.

use crate::error::{MelangeError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub type Dict = Map<String, Value>;

// ---------------------------------------------------------------------------
// Soft helpers
// ---------------------------------------------------------------------------

/// Project `target` onto `keys`. Keys absent from `target` are skipped.
pub fn filter(target: &Dict, keys: &[&str]) -> Dict {
    keys.iter()
        .filter_map(|k| target.get(*k).map(|v| (k.to_string(), v.clone())))
        .collect()
}

/// Return a copy of `target` with the keys of `updates` it lacks.
///
/// Existing target values always win. With `sub_merge`, a key present on
/// both sides is combined when both values are lists (concatenated) or both
/// are mappings (merged, recursively with the same flags if `recursive`,
/// otherwise by a plain add-missing merge). Any other pairing keeps the
/// target value.
pub fn merge(target: &Dict, updates: &Dict, sub_merge: bool, recursive: bool) -> Dict {
    let mut result = target.clone();

    for (key, update) in updates {
        let Some(existing) = result.get_mut(key) else {
            result.insert(key.clone(), update.clone());
            continue;
        };
        if !sub_merge {
            continue;
        }
        match (existing, update) {
            (Value::Array(ours), Value::Array(theirs)) => {
                ours.extend(theirs.iter().cloned());
            }
            (Value::Object(ours), Value::Object(theirs)) => {
                *ours = if recursive {
                    merge(ours, theirs, sub_merge, recursive)
                } else {
                    merge(ours, theirs, false, false)
                };
            }
            _ => {}
        }
    }

    result
}

/// Pair `keys` with `values`. Missing values become `null`; extra values are
/// dropped.
pub fn zip(keys: &[&str], values: &[Value]) -> Dict {
    keys.iter()
        .enumerate()
        .map(|(i, k)| (k.to_string(), values.get(i).cloned().unwrap_or(Value::Null)))
        .collect()
}

/// Rename keys of `target` through `table`. Only keys present in both
/// survive.
pub fn rename(target: &Dict, table: &BTreeMap<String, String>) -> Dict {
    table
        .iter()
        .filter_map(|(from, to)| target.get(from).map(|v| (to.clone(), v.clone())))
        .collect()
}

/// Map every key of `target` to itself.
pub fn identity(target: &Dict) -> Dict {
    target
        .keys()
        .map(|k| (k.clone(), Value::String(k.clone())))
        .collect()
}

pub fn contains_all(target: &Dict, keys: &[&str]) -> bool {
    keys.iter().all(|k| target.contains_key(*k))
}

/// Expand list-valued entries into one mapping per combination.
///
/// Keys are taken in sorted order and the first list-valued key varies
/// fastest. An empty mapping expands to a single empty mapping.
pub fn split(target: &Dict) -> Vec<Dict> {
    let mut results = vec![Dict::new()];

    for (key, value) in target {
        let choices: Vec<Value> = match value {
            Value::Array(items) => items.clone(),
            other => vec![other.clone()],
        };
        let mut next = Vec::with_capacity(results.len() * choices.len());
        for choice in &choices {
            for partial in &results {
                let mut expanded = partial.clone();
                expanded.insert(key.clone(), choice.clone());
                next.push(expanded);
            }
        }
        results = next;
    }

    results
}

// ---------------------------------------------------------------------------
// Hard helpers
// ---------------------------------------------------------------------------

/// Pull the values for `order` out of `target`, in order.
pub fn unzip(target: &Dict, order: &[&str]) -> Result<Vec<Value>> {
    order
        .iter()
        .map(|k| {
            target
                .get(*k)
                .cloned()
                .ok_or_else(|| MelangeError::MissingKey(k.to_string()))
        })
        .collect()
}

/// Bucket `items` by the value stored under `key`, in first-seen order.
pub fn groupby(items: &[Dict], key: &str) -> Result<Vec<(Value, Vec<Dict>)>> {
    let mut groups: Vec<(Value, Vec<Dict>)> = Vec::new();

    for item in items {
        let value = item
            .get(key)
            .ok_or_else(|| MelangeError::MissingKey(key.to_string()))?;
        match groups.iter_mut().find(|(v, _)| v == value) {
            Some((_, bucket)) => bucket.push(item.clone()),
            None => groups.push((value.clone(), vec![item.clone()])),
        }
    }

    Ok(groups)
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// An entity whose fields can be copied into a [`Dict`].
pub trait Record {
    /// Fields copied when no explicit list is given.
    fn scalar_fields(&self) -> &'static [&'static str];

    /// Value of a known field, `None` for unknown names.
    fn field(&self, name: &str) -> Option<Value>;
}

/// Shallow copy of `record`'s fields. An empty `fields` list means the
/// record's scalar fields; unknown names are dropped.
pub fn to_dict<R: Record + ?Sized>(record: &R, fields: &[&str]) -> Dict {
    let names: &[&str] = if fields.is_empty() {
        record.scalar_fields()
    } else {
        fields
    };
    names
        .iter()
        .filter_map(|name| record.field(name).map(|v| (name.to_string(), v)))
        .collect()
}

// ---------------------------------------------------------------------------
// Escaping
// ---------------------------------------------------------------------------

/// A string headed for a page: either raw text or markup already marked safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Text(String),
    Safe(String),
}

impl Markup {
    pub fn as_str(&self) -> &str {
        match self {
            Markup::Text(s) | Markup::Safe(s) => s,
        }
    }
}

/// HTML-escape the `fields` of `target`. Values marked safe are left alone
/// unless `escape_safe` is set.
pub fn clean_dict(
    target: &BTreeMap<String, Markup>,
    fields: &[&str],
    escape_safe: bool,
) -> Result<BTreeMap<String, Markup>> {
    let mut result = target.clone();

    for field in fields {
        let value = result
            .get_mut(*field)
            .ok_or_else(|| MelangeError::MissingKey(field.to_string()))?;
        let escape = match value {
            Markup::Text(_) => true,
            Markup::Safe(_) => escape_safe,
        };
        if escape {
            let escaped = html_escape::encode_quoted_attribute(value.as_str()).into_owned();
            *value = Markup::Safe(escaped);
        }
    }

    Ok(result)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
