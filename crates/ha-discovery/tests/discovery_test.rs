//! End-to-end discovery builds over YAML sensor configurations

mod common;

use common::{fixture_section, load_fixture};
use ha_config::{ConfigError, ParameterStore};
use ha_discovery::{
    build_discovery_config, Category, DeclarationId, DeviceClassRegistry, DiscoveryBuilder,
    DiscoveryError, SensorDeclaration,
};
use serde_json::{json, Value};

fn payload(config: &ha_discovery::DiscoveryConfig, index: usize) -> Value {
    serde_json::to_value(&config.messages()[index].payload).unwrap()
}

// ============================================================================
// Message order and topics
// ============================================================================

#[test]
fn test_messages_follow_declaration_then_sub_sensor_order() {
    let store = fixture_section("sensors.yaml", "HallNode");
    let config = build_discovery_config(&store).unwrap();

    let topics: Vec<&str> = config.iter().map(|m| m.topic.as_str()).collect();
    assert_eq!(
        topics,
        vec![
            "homeassistant/binary_sensor/hall_motion/config",
            "homeassistant/sensor/outside/config",
            "homeassistant/sensor/outside2/config",
            "ha/binary_sensor/front_door/config",
            "homeassistant/sensor/cpu_load/config",
            "homeassistant/sensor/memory/config",
        ]
    );
}

#[test]
fn test_rebuild_is_byte_identical() {
    let store = fixture_section("sensors.yaml", "HallNode");
    let first = build_discovery_config(&store).unwrap().to_json_lines().unwrap();
    let second = build_discovery_config(&store).unwrap().to_json_lines().unwrap();
    assert_eq!(first, second);
    assert_eq!(first.lines().count(), 6);
}

#[test]
fn test_declarations_starting_at_slot_one() {
    let store = fixture_section("sensors.yaml", "CellarNode");
    let config = DiscoveryBuilder::new()
        .with_node_id("CellarNode")
        .build(&store)
        .unwrap();

    assert_eq!(config.len(), 1);
    assert_eq!(
        config.messages()[0].topic,
        "homeassistant/sensor/cellarnode_cellar_battery/config"
    );
    assert_eq!(
        payload(&config, 0),
        json!({
            "name": "Cellar Battery",
            "device_class": "battery",
            "state_topic": "home/cellar/battery",
            "unit_of_measurement": "%",
            "value_template": "{{ value_json.battery }}"
        })
    );
}

// ============================================================================
// Binary sensors
// ============================================================================

#[test]
fn test_motion_defaults() {
    let store = ParameterStore::from_pairs(
        "Hall",
        [
            ("DeviceClass", "motion"),
            ("Sensor", "Hall"),
            ("Destination", "home/hall/motion"),
        ],
    );
    let config = build_discovery_config(&store).unwrap();

    assert_eq!(config.len(), 1);
    assert_eq!(
        payload(&config, 0),
        json!({
            "name": "Hall",
            "device_class": "motion",
            "state_topic": "home/hall/motion",
            "payload_on": "on",
            "payload_off": "off"
        })
    );
}

#[test]
fn test_binary_sensor_pairs_never_co_occur() {
    let store = fixture_section("sensors.yaml", "HallNode");
    let config = build_discovery_config(&store).unwrap();

    for message in config.iter().filter(|m| m.topic.contains("/binary_sensor/")) {
        let payload = serde_json::to_value(&message.payload).unwrap();
        let has_on_off = payload.get("payload_on").is_some() || payload.get("payload_off").is_some();
        let has_closed_open =
            payload.get("payload_closed").is_some() || payload.get("payload_open").is_some();
        assert!(has_on_off != has_closed_open, "{}", message.topic);
    }

    let door = payload(&config, 3);
    assert_eq!(door["payload_closed"], "CLOSED");
    assert_eq!(door["payload_open"], "OPEN");
    assert!(door.get("payload_on").is_none());
}

// ============================================================================
// Sensors
// ============================================================================

#[test]
fn test_temperature_expands_into_two_payloads() {
    let store = ParameterStore::from_pairs(
        "Outdoor",
        [
            ("DeviceClass", "temperature"),
            ("Sensor", "Outside,Outside2"),
            ("Destination", "home/outside"),
            ("Unit", "C,F"),
            ("ValueTemplate", "{{value_json.c}},{{value_json.f}}"),
        ],
    );
    let config = build_discovery_config(&store).unwrap();

    assert_eq!(config.len(), 2);
    let first = payload(&config, 0);
    assert_eq!(first["name"], "Outside");
    assert_eq!(first["unit_of_measurement"], "C");
    assert_eq!(first["value_template"], "{{value_json.c}}");
    let second = payload(&config, 1);
    assert_eq!(second["name"], "Outside2");
    assert_eq!(second["unit_of_measurement"], "F");
    assert_eq!(second["value_template"], "{{value_json.f}}");
}

#[test]
fn test_sensor_payload_count_matches_templates_or_units() {
    let registry = DeviceClassRegistry::new();
    let store = fixture_section("sensors.yaml", "HallNode");
    let config = build_discovery_config(&store).unwrap();

    for index in [1, 5] {
        let declaration = SensorDeclaration::read(&store, index).unwrap();
        let spec = registry.classify(&declaration.device_class).unwrap();
        assert_eq!(spec.category, Category::Sensor);

        let resolved = ha_discovery::resolve(&declaration, spec).unwrap();
        let templates = resolved.field(ha_discovery::ParamKey::ValueTemplate).unwrap();
        let expected = if templates.is_default() {
            resolved.field(ha_discovery::ParamKey::Unit).unwrap().value.entry_count()
        } else {
            templates.value.entry_count()
        };
        assert_eq!(ha_discovery::expand(&resolved).unwrap().len(), expected);
    }

    // The "sensor" label names the category, so no device_class is announced
    let cpu = payload(&config, 4);
    assert!(cpu.get("device_class").is_none());
    assert_eq!(cpu["value_template"], "");
}

// ============================================================================
// Skipped declarations
// ============================================================================

#[test]
fn test_unknown_device_class_is_skipped() {
    let store = fixture_section("sensors.yaml", "HallNode");
    let config = build_discovery_config(&store).unwrap();

    assert!(config.iter().all(|m| m.payload.name != "Mystery"));
    assert!(config.skipped().iter().any(|e| matches!(
        e,
        DiscoveryError::UnknownDeviceClass { declaration, label }
            if label == "foo" && *declaration == DeclarationId::new("HallNode", 2)
    )));
}

#[test]
fn test_missing_destination_is_skipped() {
    let store = fixture_section("sensors.yaml", "HallNode");
    let config = build_discovery_config(&store).unwrap();

    assert_eq!(config.skipped().len(), 2);
    assert!(config.skipped().iter().any(|e| matches!(
        e,
        DiscoveryError::MissingRequiredParameter { key, .. } if key == "Destination4"
    )));
    assert!(config.iter().all(|m| m.payload.name != "Bath"));
}

#[test]
fn test_field_count_mismatch_does_not_affect_siblings() {
    let store = ParameterStore::from_pairs(
        "Node",
        [
            ("DeviceClass", "temperature"),
            ("Sensor", "Outside"),
            ("Destination", "home/outside"),
            ("Unit", "C,F"),
            ("DeviceClass1", "window"),
            ("Sensor1", "Kitchen"),
            ("Destination1", "home/kitchen/window"),
        ],
    );
    let config = build_discovery_config(&store).unwrap();

    assert_eq!(config.len(), 1);
    assert_eq!(config.messages()[0].payload.name, "Kitchen");
    assert!(matches!(
        config.skipped(),
        [DiscoveryError::FieldCountMismatch { expected: 2, actual: 1, .. }]
    ));
}

// ============================================================================
// Structural failures
// ============================================================================

#[test]
fn test_unreadable_source_aborts_build() {
    let config = load_fixture("invalid_section.yaml");
    let section = config.section("BrokenNode").unwrap();

    let result = build_discovery_config(&section);
    assert!(matches!(
        result,
        Err(DiscoveryError::StructuralConfig(ConfigError::NonScalarParameter { .. }))
    ));
    assert!(result.unwrap_err().is_fatal());
}

#[test]
fn test_raw_section_matches_validated_store() {
    let config = load_fixture("sensors.yaml");
    let raw = build_discovery_config(&config.section("HallNode").unwrap()).unwrap();
    let store = build_discovery_config(&fixture_section("sensors.yaml", "HallNode")).unwrap();
    assert_eq!(raw.messages(), store.messages());
}
