//! Indexed sensor parameters
//!
//! Sensor sections declare lists by repeating a key with increasing numeric
//! suffixes: `DeviceClass`, `DeviceClass1`, `DeviceClass2`, ... Slot 0 is the
//! bare key, slot `n` is the key followed by `n`.

use crate::error::{ConfigError, ConfigResult};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Read-only access to indexed parameters
pub trait ParameterSource {
    /// Name used in diagnostics (usually the section name)
    fn name(&self) -> &str;

    /// Get the value of `key` in slot `index`
    fn get(&self, key: &str, index: usize) -> ConfigResult<Option<String>>;

    /// Every slot index holding `key`, ascending, gaps included
    fn slot_indices(&self, key: &str) -> Vec<usize>;

    /// Slot indices holding `key`, in order
    ///
    /// Slot 0 is optional so that lists written as `Key1`, `Key2`, ... are
    /// accepted. Collection stops at the first missing numbered slot.
    fn sequential_indices(&self, key: &str) -> ConfigResult<Vec<usize>> {
        let mut indices = Vec::new();
        if self.get(key, 0)?.is_some() {
            indices.push(0);
        }
        let mut index = 1;
        while self.get(key, index)?.is_some() {
            indices.push(index);
            index += 1;
        }
        Ok(indices)
    }

    /// Values of `Key`, `Key1`, `Key2`, ... in slot order
    fn get_sequential(&self, key: &str) -> ConfigResult<Vec<String>> {
        let mut values = Vec::new();
        for index in self.sequential_indices(key)? {
            if let Some(value) = self.get(key, index)? {
                values.push(value);
            }
        }
        Ok(values)
    }
}

/// The raw parameter name for `key` in slot `index`
pub fn slot_key(key: &str, index: usize) -> String {
    if index == 0 {
        key.to_string()
    } else {
        format!("{key}{index}")
    }
}

/// The slot index encoded by `raw` for `key`, if `raw` is one of its slot names
fn parse_slot(raw: &str, key: &str) -> Option<usize> {
    let suffix = raw.strip_prefix(key)?;
    if suffix.is_empty() {
        return Some(0);
    }
    if suffix.starts_with('0') || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

fn sorted_slots<'k>(keys: impl Iterator<Item = &'k str>, key: &str) -> Vec<usize> {
    let mut indices: Vec<usize> = keys.filter_map(|raw| parse_slot(raw, key)).collect();
    indices.sort_unstable();
    indices.dedup();
    indices
}

/// Render a YAML scalar the way sensor parameters store it
///
/// Returns `None` for sequences, mappings and tagged values.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}

/// Validated, in-memory parameters of one configuration section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterStore {
    name: String,
    params: BTreeMap<String, String>,
}

impl ParameterStore {
    /// Create an empty store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: BTreeMap::new(),
        }
    }

    /// Build a store from literal key/value pairs
    pub fn from_pairs<K, V>(name: impl Into<String>, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            params: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build a store from a YAML section, rejecting non-scalar values
    pub fn from_mapping(name: impl Into<String>, mapping: &Mapping) -> ConfigResult<Self> {
        let name = name.into();
        let mut params = BTreeMap::new();

        for (key, value) in mapping {
            let key = scalar_to_string(key).ok_or_else(|| ConfigError::InvalidSection {
                section: name.clone(),
            })?;
            let value = scalar_to_string(value).ok_or_else(|| ConfigError::NonScalarParameter {
                section: name.clone(),
                key: key.clone(),
            })?;
            params.insert(key, value);
        }

        Ok(Self { name, params })
    }

    /// Get a parameter by its raw (already suffixed) name
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|s| s.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl ParameterSource for ParameterStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str, index: usize) -> ConfigResult<Option<String>> {
        Ok(self.raw(&slot_key(key, index)).map(str::to_string))
    }

    fn slot_indices(&self, key: &str) -> Vec<usize> {
        sorted_slots(self.params.keys().map(String::as_str), key)
    }
}

/// An unvalidated YAML section
///
/// Values are checked when they are looked up, so a malformed parameter is
/// reported by the first read that touches it.
#[derive(Debug, Clone, Copy)]
pub struct RawSection<'a> {
    name: &'a str,
    mapping: &'a Mapping,
}

impl<'a> RawSection<'a> {
    pub fn new(name: &'a str, mapping: &'a Mapping) -> Self {
        Self { name, mapping }
    }
}

impl ParameterSource for RawSection<'_> {
    fn name(&self) -> &str {
        self.name
    }

    fn get(&self, key: &str, index: usize) -> ConfigResult<Option<String>> {
        let key = slot_key(key, index);
        match self.mapping.get(key.as_str()) {
            None => Ok(None),
            Some(value) => scalar_to_string(value).map(Some).ok_or_else(|| {
                ConfigError::NonScalarParameter {
                    section: self.name.to_string(),
                    key,
                }
            }),
        }
    }

    fn slot_indices(&self, key: &str) -> Vec<usize> {
        sorted_slots(self.mapping.keys().filter_map(Value::as_str), key)
    }
}
