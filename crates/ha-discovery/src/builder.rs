//! Top-level discovery build: classify, resolve, expand and attach topics

use crate::declaration::{DeclarationId, SensorDeclaration};
use crate::device_class::{DeviceClassRegistry, ParamKey};
use crate::error::{DiscoveryError, DiscoveryResult};
use crate::expander::{expand, DiscoveryPayload};
use crate::resolver::resolve;
use crate::topic;
use ha_config::ParameterSource;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// One discovery message: the config topic and its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryMessage {
    pub topic: String,
    pub payload: DiscoveryPayload,
}

impl DiscoveryMessage {
    /// The payload as compact JSON
    pub fn payload_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.payload)
    }
}

/// Output of a build: ordered messages plus the declarations that were skipped
#[derive(Debug, Default)]
pub struct DiscoveryConfig {
    messages: Vec<DiscoveryMessage>,
    skipped: Vec<DiscoveryError>,
    /// Config topic to the declaration that announced it
    topics: HashMap<String, DeclarationId>,
}

impl DiscoveryConfig {
    /// Messages in declaration order, then sub-sensor order
    pub fn messages(&self) -> &[DiscoveryMessage] {
        &self.messages
    }

    /// Per-declaration errors, in declaration order
    pub fn skipped(&self) -> &[DiscoveryError] {
        &self.skipped
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiscoveryMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Accept all messages of one declaration, or none if a topic is taken
    fn add_declaration(
        &mut self,
        declaration: &DeclarationId,
        messages: Vec<DiscoveryMessage>,
    ) -> DiscoveryResult<()> {
        for (i, message) in messages.iter().enumerate() {
            let taken = self.topics.get(&message.topic).cloned().or_else(|| {
                messages[..i]
                    .iter()
                    .any(|earlier| earlier.topic == message.topic)
                    .then(|| declaration.clone())
            });
            if let Some(owner) = taken {
                return Err(DiscoveryError::DuplicateTopic {
                    declaration: declaration.clone(),
                    topic: message.topic.clone(),
                    owner,
                });
            }
        }

        for message in &messages {
            self.topics.insert(message.topic.clone(), declaration.clone());
        }
        self.messages.extend(messages);
        Ok(())
    }

    /// One `{"topic": ..., "payload": {...}}` object per line
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for message in &self.messages {
            out.push_str(&serde_json::to_string(message)?);
            out.push('\n');
        }
        Ok(out)
    }

}

impl IntoIterator for DiscoveryConfig {
    type Item = DiscoveryMessage;
    type IntoIter = std::vec::IntoIter<DiscoveryMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.into_iter()
    }
}

impl<'a> IntoIterator for &'a DiscoveryConfig {
    type Item = &'a DiscoveryMessage;
    type IntoIter = std::slice::Iter<'a, DiscoveryMessage>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}

/// Builds discovery messages for every declaration in a parameter source
#[derive(Debug, Clone, Default)]
pub struct DiscoveryBuilder {
    registry: DeviceClassRegistry,
    /// Prepended to every object id
    node_id: Option<String>,
}

impl DiscoveryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix object ids with a node id (typically the section name)
    pub fn with_node_id(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    /// Build messages for every `DeviceClass` slot of `source`
    ///
    /// Per-declaration failures are logged and recorded in
    /// [`DiscoveryConfig::skipped`]; only a structural failure of the source
    /// aborts the build.
    pub fn build<S>(&self, source: &S) -> DiscoveryResult<DiscoveryConfig>
    where
        S: ParameterSource + ?Sized,
    {
        let mut config = DiscoveryConfig::default();
        self.build_into(source, &mut config)?;
        Ok(config)
    }

    /// Like [`DiscoveryBuilder::build`], appending to `config`
    ///
    /// Topics already present in `config` count as taken, so several sources
    /// can share one output without overwriting each other's entities.
    pub fn build_into<S>(&self, source: &S, config: &mut DiscoveryConfig) -> DiscoveryResult<()>
    where
        S: ParameterSource + ?Sized,
    {
        let key = ParamKey::DeviceClass.config_key();
        let indices = source.slot_indices(key);
        let sequential = source.sequential_indices(key)?;
        if sequential.len() < indices.len() {
            let after_gap: Vec<usize> = indices
                .iter()
                .copied()
                .filter(|index| !sequential.contains(index))
                .collect();
            warn!(
                "'{}' has gaps in its {} numbering, slots {:?} follow a gap",
                source.name(),
                key,
                after_gap
            );
        }
        debug!(
            "Building discovery for {} declarations in '{}'",
            indices.len(),
            source.name()
        );

        let (built, skipped) = (config.messages.len(), config.skipped.len());
        for index in indices {
            let id = DeclarationId::new(source.name(), index);
            let result = self
                .build_declaration(source, index)
                .and_then(|messages| config.add_declaration(&id, messages));
            match result {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(declaration = %id, error = %e, "Skipping sensor declaration");
                    config.skipped.push(e);
                }
            }
        }

        info!(
            "Built {} discovery messages for '{}' ({} declarations skipped)",
            config.messages.len() - built,
            source.name(),
            config.skipped.len() - skipped
        );
        Ok(())
    }

    fn build_declaration<S>(&self, source: &S, index: usize) -> DiscoveryResult<Vec<DiscoveryMessage>>
    where
        S: ParameterSource + ?Sized,
    {
        let declaration = SensorDeclaration::read(source, index)?;
        let spec = self
            .registry
            .classify(&declaration.device_class)
            .ok_or_else(|| DiscoveryError::UnknownDeviceClass {
                declaration: declaration.id.clone(),
                label: declaration.device_class.clone(),
            })?;

        let resolved = resolve(&declaration, spec)?;
        let root = topic::build(&resolved.discovery_prefix, resolved.category, &declaration.id)?;

        expand(&resolved)?
            .into_iter()
            .map(|payload| {
                let object_id =
                    topic::object_id(self.node_id.as_deref(), &payload.name, &declaration.id)?;
                let topic = root.config_topic(&object_id);
                debug!(declaration = %declaration.id, "Discovery topic {}", topic);
                Ok(DiscoveryMessage { topic, payload })
            })
            .collect()
    }
}

/// Build discovery messages for `source` with default settings
pub fn build_discovery_config<S>(source: &S) -> DiscoveryResult<DiscoveryConfig>
where
    S: ParameterSource + ?Sized,
{
    DiscoveryBuilder::new().build(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_config::ParameterStore;

    #[test]
    fn test_build_mixed_declarations() {
        let store = ParameterStore::from_pairs(
            "Node",
            [
                ("DeviceClass", "motion"),
                ("Sensor", "Hall"),
                ("Destination", "home/hall/motion"),
                ("DeviceClass1", "temperature"),
                ("Sensor1", "Outside,Outside2"),
                ("Destination1", "home/outside"),
                ("Unit1", "C,F"),
                ("ValueTemplate1", "{{value_json.c}},{{value_json.f}}"),
            ],
        );

        let config = build_discovery_config(&store).unwrap();
        let topics: Vec<&str> = config.iter().map(|m| m.topic.as_str()).collect();
        assert_eq!(
            topics,
            vec![
                "homeassistant/binary_sensor/hall/config",
                "homeassistant/sensor/outside/config",
                "homeassistant/sensor/outside2/config",
            ]
        );
        assert!(config.skipped().is_empty());
    }

    #[test]
    fn test_unknown_class_is_skipped() {
        let store = ParameterStore::from_pairs(
            "Node",
            [
                ("DeviceClass", "foo"),
                ("Sensor", "Mystery"),
                ("Destination", "home/mystery"),
                ("DeviceClass1", "door"),
                ("Sensor1", "Front"),
                ("Destination1", "home/front"),
            ],
        );

        let config = build_discovery_config(&store).unwrap();
        assert_eq!(config.len(), 1);
        assert_eq!(config.messages()[0].payload.name, "Front");
        assert!(matches!(
            config.skipped(),
            [DiscoveryError::UnknownDeviceClass { label, .. }] if label == "foo"
        ));
    }

    #[test]
    fn test_node_id_prefixes_object_id() {
        let store = ParameterStore::from_pairs(
            "Node",
            [
                ("DeviceClass", "window"),
                ("Sensor", "Kitchen"),
                ("Destination", "home/kitchen/window"),
                ("DiscoveryPrefix", "ha"),
            ],
        );

        let config = DiscoveryBuilder::new()
            .with_node_id("Ground Floor")
            .build(&store)
            .unwrap();
        assert_eq!(
            config.messages()[0].topic,
            "ha/binary_sensor/ground_floor_kitchen/config"
        );
    }

    #[test]
    fn test_colliding_object_ids_are_skipped() {
        let store = ParameterStore::from_pairs(
            "Node",
            [
                ("DeviceClass", "temperature"),
                ("Sensor", "Outside Temp,outside-temp"),
                ("Destination", "home/outside"),
                ("Unit", "C,F"),
                ("DeviceClass1", "motion"),
                ("Sensor1", "Hall"),
                ("Destination1", "home/hall"),
                ("DeviceClass2", "door"),
                ("Sensor2", "hall"),
                ("Destination2", "home/hall/door"),
            ],
        );

        let config = build_discovery_config(&store).unwrap();
        let topics: Vec<&str> = config.iter().map(|m| m.topic.as_str()).collect();
        assert_eq!(topics, vec!["homeassistant/binary_sensor/hall/config"]);

        assert_eq!(config.skipped().len(), 2);
        assert!(matches!(
            &config.skipped()[0],
            DiscoveryError::DuplicateTopic { declaration, owner, .. }
                if declaration.index() == 0 && owner.index() == 0
        ));
        assert!(matches!(
            &config.skipped()[1],
            DiscoveryError::DuplicateTopic { topic, owner, .. }
                if topic == "homeassistant/binary_sensor/hall/config" && owner.index() == 1
        ));
    }

    #[test]
    fn test_same_name_in_other_category_is_kept() {
        let store = ParameterStore::from_pairs(
            "Node",
            [
                ("DeviceClass", "motion"),
                ("Sensor", "Hall"),
                ("Destination", "home/hall/motion"),
                ("DeviceClass1", "humidity"),
                ("Sensor1", "Hall"),
                ("Destination1", "home/hall/humidity"),
                ("Unit1", "%"),
            ],
        );

        let config = build_discovery_config(&store).unwrap();
        assert_eq!(config.len(), 2);
        assert!(config.skipped().is_empty());
    }

    #[test]
    fn test_build_into_shares_topics_across_sources() {
        let first = ParameterStore::from_pairs(
            "Upstairs",
            [("DeviceClass", "window"), ("Sensor", "Küche"), ("Destination", "a")],
        );
        let second = ParameterStore::from_pairs(
            "Downstairs",
            [("DeviceClass", "window"), ("Sensor", "Küche"), ("Destination", "b")],
        );

        let builder = DiscoveryBuilder::new();
        let mut config = DiscoveryConfig::default();
        builder.build_into(&first, &mut config).unwrap();
        builder.build_into(&second, &mut config).unwrap();

        assert_eq!(config.len(), 1);
        assert_eq!(config.messages()[0].topic, "homeassistant/binary_sensor/küche/config");
        assert!(matches!(
            &config.skipped()[0],
            DiscoveryError::DuplicateTopic { declaration, owner, .. }
                if declaration.source() == "Downstairs" && owner.source() == "Upstairs"
        ));
    }

    #[test]
    fn test_declarations_after_gap_are_built() {
        let store = ParameterStore::from_pairs(
            "Node",
            [
                ("DeviceClass", "motion"),
                ("Sensor", "Hall"),
                ("Destination", "home/hall"),
                ("DeviceClass2", "door"),
                ("Sensor2", "Front"),
                ("Destination2", "home/front"),
            ],
        );

        let config = build_discovery_config(&store).unwrap();
        let names: Vec<&str> = config.iter().map(|m| m.payload.name.as_str()).collect();
        assert_eq!(names, vec!["Hall", "Front"]);
        assert!(config.skipped().is_empty());
    }

    #[test]
    fn test_empty_source() {
        let store = ParameterStore::new("Empty");
        let config = build_discovery_config(&store).unwrap();
        assert!(config.is_empty());
        assert!(config.skipped().is_empty());
    }
}
