//! Scripted state callbacks driving actuators
//!
//! A GPIO sensor section can name a callback that runs on every state
//! change, for example:
//!
//! ```yaml
//! HallPresence:
//!   EventDetection: BOTH
//!   StateCallback: switchLed
//!   StateCallbackArgs: Actuator_Occupied,Actuator_Unoccupied
//! ```

use ha_config::{ConfigError, ParameterSource};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Something that accepts direct `ON`/`OFF` style commands
pub trait Actuator {
    fn on_direct_message(&mut self, message: &str);
}

/// Actuators by name
pub type Actuators = HashMap<String, Box<dyn Actuator>>;

#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("missing callback parameter '{key}'")]
    MissingArgs { key: &'static str },

    #[error("invalid callback arguments '{value}': expected two actuator names")]
    InvalidArgs { value: String },

    #[error("unknown actuator '{name}'")]
    UnknownActuator { name: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Switches an "occupied" and an "unoccupied" LED in opposition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchLed {
    occupied: String,
    unoccupied: String,
}

impl SwitchLed {
    pub const ARGS_KEY: &'static str = "StateCallbackArgs";

    /// Capture the actuator names from `StateCallbackArgs`
    pub fn init<S>(params: &S) -> Result<Self, CallbackError>
    where
        S: ParameterSource + ?Sized,
    {
        let value = params
            .get(Self::ARGS_KEY, 0)?
            .ok_or(CallbackError::MissingArgs { key: Self::ARGS_KEY })?;

        let names: Vec<&str> = value.split(',').map(str::trim).collect();
        match names.as_slice() {
            [occupied, unoccupied] if !occupied.is_empty() && !unoccupied.is_empty() => {
                Ok(Self {
                    occupied: occupied.to_string(),
                    unoccupied: unoccupied.to_string(),
                })
            }
            _ => Err(CallbackError::InvalidArgs {
                value: value.clone(),
            }),
        }
    }

    pub fn occupied(&self) -> &str {
        &self.occupied
    }

    pub fn unoccupied(&self) -> &str {
        &self.unoccupied
    }

    /// React to a new sensor state
    ///
    /// Any state other than 1 means occupied. Both actuators are looked up
    /// before either is switched.
    pub fn state_change(&self, state: u8, actuators: &mut Actuators) -> Result<(), CallbackError> {
        for name in [&self.occupied, &self.unoccupied] {
            if !actuators.contains_key(name) {
                return Err(CallbackError::UnknownActuator { name: name.clone() });
            }
        }

        let (occupied, unoccupied) = if state != 1 { ("ON", "OFF") } else { ("OFF", "ON") };
        debug!("State {} -> {}={}, {}={}", state, self.occupied, occupied, self.unoccupied, unoccupied);

        if let Some(actuator) = actuators.get_mut(&self.occupied) {
            actuator.on_direct_message(occupied);
        }
        if let Some(actuator) = actuators.get_mut(&self.unoccupied) {
            actuator.on_direct_message(unoccupied);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_config::ParameterStore;

    #[test]
    fn test_init_reads_args() {
        let params = ParameterStore::from_pairs("Hall", [("StateCallbackArgs", "Led_A, Led_B")]);
        let callback = SwitchLed::init(&params).unwrap();
        assert_eq!(callback.occupied(), "Led_A");
        assert_eq!(callback.unoccupied(), "Led_B");
    }

    #[test]
    fn test_init_missing_args() {
        let params = ParameterStore::new("Hall");
        assert!(matches!(
            SwitchLed::init(&params),
            Err(CallbackError::MissingArgs { .. })
        ));
    }

    #[test]
    fn test_init_rejects_wrong_arity() {
        for value in ["OnlyOne", "a,b,c", "a,"] {
            let params = ParameterStore::from_pairs("Hall", [("StateCallbackArgs", value)]);
            assert!(
                matches!(SwitchLed::init(&params), Err(CallbackError::InvalidArgs { .. })),
                "{value}"
            );
        }
    }
}
