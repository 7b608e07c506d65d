//! Hand-off of discovery messages to transport publishers

use crate::builder::DiscoveryConfig;
use thiserror::Error;
use tracing::debug;

/// Discovery messages are always retained so the hub sees them after a restart
pub const DISCOVERY_RETAIN: bool = true;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to serialize discovery payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to publish to '{topic}': {message}")]
    Transport { topic: String, message: String },
}

/// A transport that can publish a message to a topic
pub trait DiscoveryPublisher {
    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), PublishError>;
}

/// Publish every message of `config` to every publisher, in order
///
/// Returns the number of messages sent per publisher.
pub fn publish_discovery(
    config: &DiscoveryConfig,
    publishers: &mut [&mut dyn DiscoveryPublisher],
) -> Result<usize, PublishError> {
    for message in config {
        let payload = message.payload_json()?;
        for publisher in publishers.iter_mut() {
            publisher.publish(&message.topic, &payload, DISCOVERY_RETAIN)?;
        }
        debug!("Published discovery config to {}", message.topic);
    }
    Ok(config.len())
}
