//! Error types for discovery config building

use crate::declaration::DeclarationId;
use ha_config::ConfigError;
use thiserror::Error;

/// Result type for discovery operations
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors raised while turning sensor declarations into discovery messages
///
/// Everything except [`DiscoveryError::StructuralConfig`] concerns exactly
/// one declaration: the builder logs it, skips that declaration and keeps
/// going.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The device class label is not in the taxonomy
    #[error("{declaration}: unknown device class '{label}'")]
    UnknownDeviceClass {
        declaration: DeclarationId,
        label: String,
    },

    /// A parameter the device class requires is absent
    #[error("{declaration}: missing required parameter '{key}'")]
    MissingRequiredParameter {
        declaration: DeclarationId,
        key: String,
    },

    /// A list-valued field does not line up with its siblings
    #[error("{declaration}: '{field}' has {actual} entries, expected {expected}")]
    FieldCountMismatch {
        declaration: DeclarationId,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A topic segment cannot be used in an MQTT topic
    #[error("{declaration}: invalid topic segment '{segment}': {reason}")]
    InvalidTopicSegment {
        declaration: DeclarationId,
        segment: String,
        reason: &'static str,
    },

    /// Another entity already announced on this config topic
    #[error("{declaration}: config topic '{topic}' is already used by {owner}")]
    DuplicateTopic {
        declaration: DeclarationId,
        topic: String,
        owner: DeclarationId,
    },

    /// The parameter source itself could not be read
    #[error("structural configuration error: {0}")]
    StructuralConfig(#[from] ConfigError),
}

impl DiscoveryError {
    /// Whether this error aborts the whole build
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StructuralConfig(_))
    }
}
