//! Expansion of a resolved declaration into one payload per sub-sensor

use crate::device_class::{Category, ParamKey};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::resolver::{ResolvedConfig, ResolvedField};
use serde::Serialize;

/// State payload pair of a binary sensor
///
/// The two variants are mutually exclusive in a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StatePayloads {
    OnOff {
        payload_on: String,
        payload_off: String,
    },
    ClosedOpen {
        payload_closed: String,
        payload_open: String,
    },
}

/// Discovery payload for one entity
///
/// Field order is the serialization order, so identical input always
/// produces identical JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_class: Option<String>,
    pub state_topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_of_measurement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_template: Option<String>,
    #[serde(flatten)]
    pub state_payloads: Option<StatePayloads>,
}

/// Expand a resolved config into its payloads, in sub-sensor order
pub fn expand(resolved: &ResolvedConfig) -> DiscoveryResult<Vec<DiscoveryPayload>> {
    match resolved.category {
        Category::BinarySensor => expand_binary_sensor(resolved).map(|payload| vec![payload]),
        Category::Sensor => expand_sensor(resolved),
    }
}

fn expand_binary_sensor(resolved: &ResolvedConfig) -> DiscoveryResult<DiscoveryPayload> {
    check_count(resolved, ParamKey::Sensor, 1)?;

    let state_payloads = match (
        resolved.field(ParamKey::PayloadClosed),
        resolved.field(ParamKey::PayloadOpen),
    ) {
        (Some(closed), Some(open)) => StatePayloads::ClosedOpen {
            payload_closed: closed.entry(0).to_string(),
            payload_open: open.entry(0).to_string(),
        },
        _ => StatePayloads::OnOff {
            payload_on: entry(resolved, ParamKey::PayloadOn, 0)?,
            payload_off: entry(resolved, ParamKey::PayloadOff, 0)?,
        },
    };

    Ok(DiscoveryPayload {
        name: entry(resolved, ParamKey::Sensor, 0)?,
        device_class: resolved.device_class.clone(),
        state_topic: entry(resolved, ParamKey::Destination, 0)?,
        unit_of_measurement: None,
        value_template: None,
        state_payloads: Some(state_payloads),
    })
}

fn expand_sensor(resolved: &ResolvedConfig) -> DiscoveryResult<Vec<DiscoveryPayload>> {
    // Configured templates decide the count; units stand in when they are defaulted
    let count = match resolved.field(ParamKey::ValueTemplate) {
        Some(templates) if !templates.is_default() => templates.value.entry_count(),
        _ => field(resolved, ParamKey::Unit)?.value.entry_count(),
    };

    for key in [ParamKey::Sensor, ParamKey::Unit, ParamKey::ValueTemplate] {
        check_count(resolved, key, count)?;
    }

    (0..count)
        .map(|index| {
            Ok(DiscoveryPayload {
                name: entry(resolved, ParamKey::Sensor, index)?,
                device_class: resolved.device_class.clone(),
                state_topic: entry(resolved, ParamKey::Destination, index)?,
                unit_of_measurement: Some(entry(resolved, ParamKey::Unit, index)?),
                value_template: Some(entry(resolved, ParamKey::ValueTemplate, index)?),
                state_payloads: None,
            })
        })
        .collect()
}

/// Configured list fields must hold exactly `expected` entries; defaults are shared
fn check_count(resolved: &ResolvedConfig, key: ParamKey, expected: usize) -> DiscoveryResult<()> {
    let Some(field) = resolved.field(key) else {
        return Ok(());
    };
    let actual = field.value.entry_count();
    if field.is_default() || actual == expected {
        return Ok(());
    }
    Err(DiscoveryError::FieldCountMismatch {
        declaration: resolved.declaration.clone(),
        field: key.output_key(),
        expected,
        actual,
    })
}

fn field(resolved: &ResolvedConfig, key: ParamKey) -> DiscoveryResult<&ResolvedField> {
    resolved
        .field(key)
        .ok_or_else(|| DiscoveryError::MissingRequiredParameter {
            key: resolved.declaration.key_name(key),
            declaration: resolved.declaration.clone(),
        })
}

fn entry(resolved: &ResolvedConfig, key: ParamKey, index: usize) -> DiscoveryResult<String> {
    field(resolved, key).map(|field| field.entry(index).to_string())
}
