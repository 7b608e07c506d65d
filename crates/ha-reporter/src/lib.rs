//! Sensor reporter glue
//!
//! Builds discovery messages for every sensor section of a configuration and
//! hosts the scripted actuator callbacks.

pub mod callback;
pub mod publisher;

pub use callback::{Actuator, Actuators, CallbackError, SwitchLed};
pub use publisher::{LineFormat, StreamPublisher};

use ha_config::{ParameterSource, SensorConfig, LOGGING_SECTION};
use ha_discovery::{DiscoveryBuilder, DiscoveryConfig, DiscoveryResult, ParamKey};
use tracing::{debug, warn};

/// Build discovery for the selected sections, or every sensor section if none are selected
///
/// Each section's name becomes the node id of its entities. Config topics are
/// unique across all sections. A section that is not valid configuration
/// aborts the build.
pub fn build_sections(config: &SensorConfig, selected: &[String]) -> DiscoveryResult<DiscoveryConfig> {
    for name in selected {
        if config.section(name).is_none() {
            warn!("Section '{}' not found in configuration", name);
        }
    }

    let mut output = DiscoveryConfig::default();
    for name in config.section_names() {
        if name == LOGGING_SECTION || (!selected.is_empty() && !selected.iter().any(|s| s == name)) {
            continue;
        }

        let Some(store) = config.parameter_store(name)? else {
            continue;
        };
        if store.slot_indices(ParamKey::DeviceClass.config_key()).is_empty() {
            debug!("Section '{}' declares no discovery sensors", name);
            continue;
        }

        DiscoveryBuilder::new()
            .with_node_id(name)
            .build_into(&store, &mut output)?;
    }
    Ok(output)
}
