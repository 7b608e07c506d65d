//! secrets.yaml lookup for `!secret` parameters

use crate::error::{ConfigError, ConfigResult};
use crate::parameters::scalar_to_string;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Secrets store loaded from the secrets.yaml next to a sensor config file
#[derive(Debug, Clone)]
pub struct Secrets {
    secrets: HashMap<String, String>,
}

impl Secrets {
    /// Load secrets from `<config_dir>/secrets.yaml`
    ///
    /// A missing file yields an empty store; it only becomes an error once a
    /// `!secret` tag asks for a key.
    pub fn load(config_dir: &Path) -> ConfigResult<Self> {
        let path = config_dir.join("secrets.yaml");

        if !path.exists() {
            debug!("No secrets.yaml found at {:?}, using empty secrets", path);
            return Ok(Self {
                secrets: HashMap::new(),
            });
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
            path: path.clone(),
            source: e,
        })?;

        let raw: HashMap<String, serde_yaml::Value> =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseYaml {
                path: path.clone(),
                source: e,
            })?;

        let mut secrets = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let value = scalar_to_string(&value).ok_or_else(|| ConfigError::NonScalarParameter {
                section: "secrets.yaml".to_string(),
                key: key.clone(),
            })?;
            secrets.insert(key, value);
        }

        debug!("Loaded {} secrets from {:?}", secrets.len(), path);

        Ok(Self { secrets })
    }

    /// Get a secret by key
    pub fn get(&self, key: &str) -> ConfigResult<&str> {
        self.secrets
            .get(key)
            .map(|s| s.as_str())
            .ok_or_else(|| ConfigError::SecretNotFound {
                key: key.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}
