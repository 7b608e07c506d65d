//! Sensor configuration file loader
//!
//! A sensor configuration is a YAML mapping of section names to flat
//! parameter mappings:
//!
//! ```yaml
//! Logging:
//!   Level: debug
//! HallSensors:
//!   DeviceClass: motion
//!   Sensor: Hall Motion
//!   Destination: home/hall/motion
//! ```
//!
//! Supported tags:
//! - `!secret key` - Substitute from secrets.yaml
//! - `!env_var VAR` - Environment variable substitution

use crate::error::{ConfigError, ConfigResult};
use crate::parameters::{ParameterStore, RawSection};
use crate::secrets::Secrets;
use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Section holding process-wide logging parameters
pub const LOGGING_SECTION: &str = "Logging";

/// A loaded sensor configuration, sections in file order
#[derive(Debug, Clone, Default)]
pub struct SensorConfig {
    sections: IndexMap<String, Mapping>,
}

impl SensorConfig {
    /// Section names in file order
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(|s| s.as_str())
    }

    /// Borrow a section without validating its values
    pub fn section(&self, name: &str) -> Option<RawSection<'_>> {
        self.sections
            .get_key_value(name)
            .map(|(name, mapping)| RawSection::new(name, mapping))
    }

    /// All sections, unvalidated, in file order
    pub fn sections(&self) -> impl Iterator<Item = RawSection<'_>> {
        self.sections
            .iter()
            .map(|(name, mapping)| RawSection::new(name, mapping))
    }

    /// Validate a section into a [`ParameterStore`]
    pub fn parameter_store(&self, name: &str) -> ConfigResult<Option<ParameterStore>> {
        self.sections
            .get(name)
            .map(|mapping| ParameterStore::from_mapping(name, mapping))
            .transpose()
    }

    /// `Logging.Level`, if configured
    pub fn logging_level(&self) -> ConfigResult<Option<String>> {
        match self.parameter_store(LOGGING_SECTION)? {
            Some(store) => Ok(store.raw("Level").map(|level| level.trim().to_lowercase())),
            None => Ok(None),
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

/// Resolves tags while turning a YAML document into a [`SensorConfig`]
pub struct SensorConfigLoader {
    /// Base directory for relative paths and secrets.yaml
    config_dir: PathBuf,
    secrets: Secrets,
}

impl SensorConfigLoader {
    /// Create a loader for the given config directory
    pub fn new(config_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let config_dir = config_dir.into();
        let secrets = Secrets::load(&config_dir)?;

        Ok(Self {
            config_dir,
            secrets,
        })
    }

    /// Load and process a config file
    pub fn load_file(&self, path: impl AsRef<Path>) -> ConfigResult<SensorConfig> {
        let path = self.resolve_path(path.as_ref());
        debug!("Loading sensor config: {:?}", path);

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        self.load_string(&content, &path)
    }

    /// Load and process a config document from a string
    pub fn load_string(&self, content: &str, source_path: &Path) -> ConfigResult<SensorConfig> {
        let value: Value = serde_yaml::from_str(content).map_err(|e| ConfigError::ParseYaml {
            path: source_path.to_path_buf(),
            source: e,
        })?;

        let root = match value {
            Value::Mapping(map) => map,
            // An empty document has no sections
            Value::Null => Mapping::new(),
            _ => {
                return Err(ConfigError::InvalidSection {
                    section: source_path.display().to_string(),
                })
            }
        };

        let mut sections = IndexMap::with_capacity(root.len());
        for (name, body) in root {
            let name = match name {
                Value::String(s) => s,
                other => {
                    return Err(ConfigError::InvalidSection {
                        section: format!("{:?}", other),
                    })
                }
            };
            let body = match body {
                Value::Mapping(map) => self.process_section(&name, map)?,
                Value::Null => Mapping::new(),
                _ => return Err(ConfigError::InvalidSection { section: name }),
            };
            trace!("Section '{}' has {} parameters", name, body.len());
            sections.insert(name, body);
        }

        debug!("Loaded {} sections from {:?}", sections.len(), source_path);
        Ok(SensorConfig { sections })
    }

    /// Resolve tags on every parameter of a section
    fn process_section(&self, section: &str, map: Mapping) -> ConfigResult<Mapping> {
        let mut result = Mapping::with_capacity(map.len());
        for (key, value) in map {
            let value = match value {
                Value::Tagged(tagged) => self.process_tagged(section, *tagged)?,
                other => other,
            };
            result.insert(key, value);
        }
        Ok(result)
    }

    /// Process a tagged value
    fn process_tagged(
        &self,
        section: &str,
        tagged: serde_yaml::value::TaggedValue,
    ) -> ConfigResult<Value> {
        let tag = tagged.tag.to_string();
        trace!("Processing tag '{}' in section '{}'", tag, section);

        match tag.as_str() {
            "!secret" => self.process_secret(tagged.value),
            "!env_var" => self.process_env_var(tagged.value),
            _ => Err(ConfigError::InvalidValue {
                key: format!("{section}: {tag}"),
                reason: "unsupported tag".to_string(),
            }),
        }
    }

    /// Process !secret tag
    fn process_secret(&self, value: Value) -> ConfigResult<Value> {
        let key = match value {
            Value::String(s) => s,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "!secret".to_string(),
                    reason: "secret key must be a string".to_string(),
                })
            }
        };

        let secret_value = self.secrets.get(&key)?;
        debug!("Substituted secret: {}", key);
        Ok(Value::String(secret_value.to_string()))
    }

    /// Process !env_var tag
    fn process_env_var(&self, value: Value) -> ConfigResult<Value> {
        let var_name = match value {
            Value::String(s) => s,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: "!env_var".to_string(),
                    reason: "environment variable name must be a string".to_string(),
                })
            }
        };

        let env_value = std::env::var(&var_name).map_err(|_| ConfigError::EnvVarNotFound {
            var: var_name.clone(),
        })?;

        debug!("Substituted env var: {}", var_name);
        Ok(Value::String(env_value))
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }
}

/// Load a sensor config file, reading secrets.yaml from the file's directory
pub fn load_sensor_config(path: impl AsRef<Path>) -> ConfigResult<SensorConfig> {
    let path = path.as_ref();
    let config_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let loader = SensorConfigLoader::new(config_dir)?;
    loader.load_file(path)
}

/// Load a sensor config document from a string
pub fn load_sensor_config_str(
    config_dir: impl Into<PathBuf>,
    content: &str,
    source_name: &str,
) -> ConfigResult<SensorConfig> {
    let loader = SensorConfigLoader::new(config_dir)?;
    loader.load_string(content, Path::new(source_name))
}
