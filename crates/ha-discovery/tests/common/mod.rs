//! Shared helpers for discovery integration tests

use ha_config::{load_sensor_config, ParameterStore, SensorConfig};
use std::path::{Path, PathBuf};

/// Path of a fixture under `tests/fixtures/`
pub fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Load a fixture file as a sensor config
pub fn load_fixture(name: &str) -> SensorConfig {
    let path = fixture_path(name);
    load_sensor_config(&path).unwrap_or_else(|e| {
        panic!("Failed to load fixture '{}' from {:?}: {}", name, path, e)
    })
}

/// Load one validated section of a fixture
pub fn fixture_section(name: &str, section: &str) -> ParameterStore {
    load_fixture(name)
        .parameter_store(section)
        .unwrap_or_else(|e| panic!("Section '{}' of '{}' is invalid: {}", section, name, e))
        .unwrap_or_else(|| panic!("Fixture '{}' has no section '{}'", name, section))
}
