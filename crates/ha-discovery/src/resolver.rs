//! Required/optional parameter resolution for one declaration

use crate::declaration::{DeclarationId, SensorDeclaration};
use crate::device_class::{Category, DeviceClassSpec, ParamKey, DEFAULT_DISCOVERY_PREFIX};
use crate::error::{DiscoveryError, DiscoveryResult};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A resolved field value, before sub-sensor expansion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Parse a raw parameter, splitting list-valued keys on `,`
    ///
    /// List entries are trimmed. Scalars are kept verbatim.
    fn parse(key: ParamKey, raw: &str) -> Self {
        if key.is_list() {
            Self::List(raw.split(',').map(|entry| entry.trim().to_string()).collect())
        } else {
            Self::Scalar(raw.to_string())
        }
    }

    /// Number of entries; scalars count as one
    pub fn entry_count(&self) -> usize {
        match self {
            Self::Scalar(_) => 1,
            Self::List(entries) => entries.len(),
        }
    }
}

/// Whether a value was configured or filled in from a default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrigin {
    Configured,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    pub value: FieldValue,
    pub origin: ValueOrigin,
}

impl ResolvedField {
    fn configured(key: ParamKey, raw: &str) -> Self {
        Self {
            value: FieldValue::parse(key, raw),
            origin: ValueOrigin::Configured,
        }
    }

    fn default(key: ParamKey, default: &str) -> Self {
        Self {
            value: FieldValue::parse(key, default),
            origin: ValueOrigin::Default,
        }
    }

    /// The entry sub-sensor `index` receives
    ///
    /// Scalars and defaulted lists are shared by every sub-sensor. Configured
    /// lists are count-checked before expansion, so `index` is in range.
    pub fn entry(&self, index: usize) -> &str {
        match &self.value {
            FieldValue::Scalar(value) => value,
            FieldValue::List(entries) => {
                let slot = if self.is_default() { 0 } else { index };
                entries.get(slot).map(|s| s.as_str()).unwrap_or("")
            }
        }
    }

    pub fn is_default(&self) -> bool {
        self.origin == ValueOrigin::Default
    }
}

/// Output of resolution: everything needed to expand payloads and topics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub declaration: DeclarationId,
    pub category: Category,
    /// `None` when the label names the category itself
    pub device_class: Option<String>,
    /// Trimmed discovery prefix
    pub discovery_prefix: String,
    fields: BTreeMap<ParamKey, ResolvedField>,
}

impl ResolvedConfig {
    pub fn field(&self, key: ParamKey) -> Option<&ResolvedField> {
        self.fields.get(&key)
    }

    pub fn has(&self, key: ParamKey) -> bool {
        self.fields.contains_key(&key)
    }

    /// Payload fields in key order
    pub fn fields(&self) -> impl Iterator<Item = (ParamKey, &ResolvedField)> {
        self.fields.iter().map(|(key, field)| (*key, field))
    }
}

/// Resolve a declaration against the rules of its category
pub fn resolve(
    declaration: &SensorDeclaration,
    spec: &DeviceClassSpec,
) -> DiscoveryResult<ResolvedConfig> {
    let id = &declaration.id;
    let mut fields = BTreeMap::new();

    for key in spec.required {
        let raw = declaration.value(*key).ok_or_else(|| {
            DiscoveryError::MissingRequiredParameter {
                key: id.key_name(*key),
                declaration: id.clone(),
            }
        })?;
        fields.insert(*key, ResolvedField::configured(*key, raw));
    }

    let mut discovery_prefix = DEFAULT_DISCOVERY_PREFIX.to_string();
    for (key, default) in spec.optional {
        let field = match declaration.value(*key) {
            Some(raw) => ResolvedField::configured(*key, raw),
            None => {
                debug!(declaration = %id, "{} not set, using default {:?}", key, default);
                ResolvedField::default(*key, default)
            }
        };

        if *key == ParamKey::DiscoveryPrefix {
            if let FieldValue::Scalar(prefix) = field.value {
                discovery_prefix = prefix.trim().to_string();
            }
        } else {
            fields.insert(*key, field);
        }
    }

    if let Some(pair) = &spec.overrides {
        let [first, second] = pair.with;
        match (declaration.value(first), declaration.value(second)) {
            (None, None) => {}
            (Some(first_raw), Some(second_raw)) => {
                for replaced in pair.replaces {
                    if declaration.has(replaced) {
                        warn!(
                            declaration = %id,
                            "{} is ignored because {}/{} are set", replaced, first, second
                        );
                    }
                    fields.remove(&replaced);
                }
                fields.insert(first, ResolvedField::configured(first, first_raw));
                fields.insert(second, ResolvedField::configured(second, second_raw));
            }
            (Some(_), None) | (None, Some(_)) => {
                let missing = if declaration.has(first) { second } else { first };
                return Err(DiscoveryError::MissingRequiredParameter {
                    key: id.key_name(missing),
                    declaration: id.clone(),
                });
            }
        }
    }

    let device_class = (declaration.device_class != spec.category.as_str())
        .then(|| declaration.device_class.clone());

    Ok(ResolvedConfig {
        declaration: id.clone(),
        category: spec.category,
        device_class,
        discovery_prefix,
        fields,
    })
}
