//! Device class taxonomy
//!
//! Maps device class labels onto the two discovery categories this crate can
//! announce, together with the parameters each category requires and the
//! defaults applied to its optional parameters.

use std::fmt;

/// Discovery category, the second segment of a discovery topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    BinarySensor,
    Sensor,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BinarySensor => "binary_sensor",
            Self::Sensor => "sensor",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sensor parameter known to the taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParamKey {
    DeviceClass,
    Sensor,
    Destination,
    Unit,
    ValueTemplate,
    DiscoveryPrefix,
    PayloadOn,
    PayloadOff,
    PayloadClosed,
    PayloadOpen,
}

impl ParamKey {
    pub const ALL: [ParamKey; 10] = [
        ParamKey::DeviceClass,
        ParamKey::Sensor,
        ParamKey::Destination,
        ParamKey::Unit,
        ParamKey::ValueTemplate,
        ParamKey::DiscoveryPrefix,
        ParamKey::PayloadOn,
        ParamKey::PayloadOff,
        ParamKey::PayloadClosed,
        ParamKey::PayloadOpen,
    ];

    /// Parameter name in the sensor configuration
    pub fn config_key(&self) -> &'static str {
        match self {
            Self::DeviceClass => "DeviceClass",
            Self::Sensor => "Sensor",
            Self::Destination => "Destination",
            Self::Unit => "Unit",
            Self::ValueTemplate => "ValueTemplate",
            Self::DiscoveryPrefix => "DiscoveryPrefix",
            Self::PayloadOn => "PayLoadOn",
            Self::PayloadOff => "PayLoadOff",
            Self::PayloadClosed => "PayLoadClosed",
            Self::PayloadOpen => "PayLoadOpen",
        }
    }

    /// Key in the discovery payload
    pub fn output_key(&self) -> &'static str {
        match self {
            Self::DeviceClass => "device_class",
            Self::Sensor => "name",
            Self::Destination => "state_topic",
            Self::Unit => "unit_of_measurement",
            Self::ValueTemplate => "value_template",
            Self::DiscoveryPrefix => "discovery_prefix",
            Self::PayloadOn => "payload_on",
            Self::PayloadOff => "payload_off",
            Self::PayloadClosed => "payload_closed",
            Self::PayloadOpen => "payload_open",
        }
    }

    /// Whether the value is a comma-separated list, one entry per sub-sensor
    pub fn is_list(&self) -> bool {
        matches!(self, Self::Sensor | Self::Unit | Self::ValueTemplate)
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

/// Two optional keys that, when configured, take the place of another pair
#[derive(Debug)]
pub struct OverridePair {
    pub replaces: [ParamKey; 2],
    pub with: [ParamKey; 2],
}

/// Parameter rules for one category
#[derive(Debug)]
pub struct DeviceClassSpec {
    pub category: Category,
    /// Device class labels belonging to this category
    pub labels: &'static [&'static str],
    pub required: &'static [ParamKey],
    /// Optional keys with their defaults
    pub optional: &'static [(ParamKey, &'static str)],
    pub overrides: Option<OverridePair>,
}

impl DeviceClassSpec {
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(&label)
    }

    pub fn default_for(&self, key: ParamKey) -> Option<&'static str> {
        self.optional
            .iter()
            .find(|(optional, _)| *optional == key)
            .map(|(_, default)| *default)
    }
}

/// Default discovery prefix used by Home Assistant
pub const DEFAULT_DISCOVERY_PREFIX: &str = "homeassistant";

static BINARY_SENSOR: DeviceClassSpec = DeviceClassSpec {
    category: Category::BinarySensor,
    labels: &["binary_sensor", "motion", "door", "window"],
    required: &[ParamKey::Sensor, ParamKey::Destination],
    optional: &[
        (ParamKey::PayloadOn, "on"),
        (ParamKey::PayloadOff, "off"),
        (ParamKey::DiscoveryPrefix, DEFAULT_DISCOVERY_PREFIX),
    ],
    overrides: Some(OverridePair {
        replaces: [ParamKey::PayloadOn, ParamKey::PayloadOff],
        with: [ParamKey::PayloadClosed, ParamKey::PayloadOpen],
    }),
};

static SENSOR: DeviceClassSpec = DeviceClassSpec {
    category: Category::Sensor,
    labels: &["sensor", "humidity", "temperature", "battery"],
    required: &[ParamKey::Sensor, ParamKey::Destination, ParamKey::Unit],
    optional: &[
        (ParamKey::ValueTemplate, ""),
        (ParamKey::DiscoveryPrefix, DEFAULT_DISCOVERY_PREFIX),
    ],
    overrides: None,
};

static SPECS: [&DeviceClassSpec; 2] = [&BINARY_SENSOR, &SENSOR];

/// Lookup over the fixed device class taxonomy
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceClassRegistry;

impl DeviceClassRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Find the category rules for a device class label
    ///
    /// Surrounding whitespace is ignored; matching is otherwise exact.
    pub fn classify(&self, label: &str) -> Option<&'static DeviceClassSpec> {
        let label = label.trim();
        SPECS.iter().copied().find(|spec| spec.contains(label))
    }

    pub fn spec(&self, category: Category) -> &'static DeviceClassSpec {
        match category {
            Category::BinarySensor => &BINARY_SENSOR,
            Category::Sensor => &SENSOR,
        }
    }

    pub fn specs(&self) -> impl Iterator<Item = &'static DeviceClassSpec> {
        SPECS.iter().copied()
    }
}
