//! Sensor configuration loading
//!
//! This crate reads YAML sensor configuration files and exposes each section
//! as indexed parameters (`Key`, `Key1`, `Key2`, ...):
//!
//! - `!secret key` - Substitute from secrets.yaml
//! - `!env_var VAR` - Environment variable substitution
//!
//! # Example
//!
//! ```ignore
//! use ha_config::{load_sensor_config, ParameterSource};
//!
//! let config = load_sensor_config("/etc/sensor_reporter/sensors.yaml")?;
//! let store = config.parameter_store("HallSensors")?.unwrap();
//! let classes = store.get_sequential("DeviceClass")?;
//! ```

mod error;
mod loader;
mod parameters;
mod secrets;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    load_sensor_config, load_sensor_config_str, SensorConfig, SensorConfigLoader, LOGGING_SECTION,
};
pub use parameters::{slot_key, ParameterSource, ParameterStore, RawSection};
pub use secrets::Secrets;
