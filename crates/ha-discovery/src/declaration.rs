//! A single sensor declaration read out of a parameter source

use crate::device_class::ParamKey;
use crate::error::{DiscoveryError, DiscoveryResult};
use ha_config::{slot_key, ParameterSource};
use std::collections::BTreeMap;
use std::fmt;

/// Where a declaration lives: the source it came from and its slot there
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclarationId {
    source: String,
    index: usize,
}

impl DeclarationId {
    pub fn new(source: impl Into<String>, index: usize) -> Self {
        Self {
            source: source.into(),
            index,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The suffixed parameter name of `key` for this slot
    pub fn key_name(&self, key: ParamKey) -> String {
        slot_key(key.config_key(), self.index)
    }
}

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source, self.index)
    }
}

/// Raw parameter values of one declaration slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SensorDeclaration {
    pub id: DeclarationId,
    pub device_class: String,
    values: BTreeMap<ParamKey, String>,
}

impl SensorDeclaration {
    /// Read every known parameter for slot `index`
    ///
    /// Lookup failures in the source are structural and propagate as such.
    pub fn read<S>(source: &S, index: usize) -> DiscoveryResult<Self>
    where
        S: ParameterSource + ?Sized,
    {
        let id = DeclarationId::new(source.name(), index);
        let mut values = BTreeMap::new();

        for key in ParamKey::ALL {
            if let Some(value) = source.get(key.config_key(), index)? {
                values.insert(key, value);
            }
        }

        let device_class = values.remove(&ParamKey::DeviceClass).ok_or_else(|| {
            DiscoveryError::MissingRequiredParameter {
                key: id.key_name(ParamKey::DeviceClass),
                declaration: id.clone(),
            }
        })?;

        Ok(Self {
            id,
            device_class: device_class.trim().to_string(),
            values,
        })
    }

    /// Build a declaration from already materialized values
    pub fn new(
        id: DeclarationId,
        device_class: impl Into<String>,
        values: impl IntoIterator<Item = (ParamKey, String)>,
    ) -> Self {
        Self {
            id,
            device_class: device_class.into(),
            values: values
                .into_iter()
                .filter(|(key, _)| *key != ParamKey::DeviceClass)
                .collect(),
        }
    }

    /// Configured value of `key`, if present (an empty string counts as present)
    pub fn value(&self, key: ParamKey) -> Option<&str> {
        self.values.get(&key).map(|s| s.as_str())
    }

    pub fn has(&self, key: ParamKey) -> bool {
        self.values.contains_key(&key)
    }
}
