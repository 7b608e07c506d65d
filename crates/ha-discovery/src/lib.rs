//! Home Assistant MQTT discovery config builder
//!
//! Turns indexed sensor declarations (`DeviceClass`, `DeviceClass1`, ...) into
//! discovery messages, one per entity:
//!
//! - classify each declaration into `binary_sensor` or `sensor`
//! - resolve required parameters and apply defaults to optional ones
//! - expand grouped declarations into one payload per sub-sensor
//! - attach `{prefix}/{category}/{object_id}/config` topics
//!
//! Declarations that cannot be announced are logged and skipped; only an
//! unreadable parameter source fails the build.
//!
//! # Example
//!
//! ```ignore
//! use ha_config::ParameterStore;
//! use ha_discovery::build_discovery_config;
//!
//! let store = ParameterStore::from_pairs("Hall", [
//!     ("DeviceClass", "motion"),
//!     ("Sensor", "Hall Motion"),
//!     ("Destination", "home/hall/motion"),
//! ]);
//! for message in &build_discovery_config(&store)? {
//!     println!("{} {}", message.topic, message.payload_json()?);
//! }
//! ```

mod builder;
mod declaration;
mod device_class;
mod error;
mod expander;
mod publish;
mod resolver;
pub mod topic;

pub use builder::{build_discovery_config, DiscoveryBuilder, DiscoveryConfig, DiscoveryMessage};
pub use declaration::{DeclarationId, SensorDeclaration};
pub use device_class::{
    Category, DeviceClassRegistry, DeviceClassSpec, OverridePair, ParamKey,
    DEFAULT_DISCOVERY_PREFIX,
};
pub use error::{DiscoveryError, DiscoveryResult};
pub use expander::{expand, DiscoveryPayload, StatePayloads};
pub use publish::{publish_discovery, DiscoveryPublisher, PublishError, DISCOVERY_RETAIN};
pub use resolver::{resolve, FieldValue, ResolvedConfig, ResolvedField, ValueOrigin};
pub use topic::TopicRoot;
