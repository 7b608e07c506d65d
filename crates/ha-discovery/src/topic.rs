//! Discovery topic construction
//!
//! Format: `{prefix}/{category}/{object_id}/config`

use crate::declaration::DeclarationId;
use crate::device_class::Category;
use crate::error::{DiscoveryError, DiscoveryResult};
use std::fmt;

/// The `{prefix}/{category}` root shared by every entity of a declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRoot {
    prefix: String,
    category: Category,
}

impl TopicRoot {
    /// Full config topic for one entity
    pub fn config_topic(&self, object_id: &str) -> String {
        format!("{}/{}/{}/config", self.prefix, self.category, object_id)
    }
}

impl fmt::Display for TopicRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.prefix, self.category)
    }
}

/// Build the topic root for a declaration
///
/// The prefix is trimmed and must be a single, non-empty topic level.
pub fn build(
    prefix: &str,
    category: Category,
    declaration: &DeclarationId,
) -> DiscoveryResult<TopicRoot> {
    let prefix = prefix.trim();
    let invalid = |reason| DiscoveryError::InvalidTopicSegment {
        declaration: declaration.clone(),
        segment: prefix.to_string(),
        reason,
    };

    if prefix.is_empty() {
        return Err(invalid("discovery prefix is empty"));
    }
    if prefix.contains('/') {
        return Err(invalid("discovery prefix must be a single topic level"));
    }
    if prefix.contains(['#', '+']) {
        return Err(invalid("discovery prefix must not contain MQTT wildcards"));
    }

    Ok(TopicRoot {
        prefix: prefix.to_string(),
        category,
    })
}

/// Object id of an entity: the slugified node id and entity name
pub fn object_id(
    node_id: Option<&str>,
    name: &str,
    declaration: &DeclarationId,
) -> DiscoveryResult<String> {
    let name_slug = slugify(name);
    if name_slug.is_empty() {
        return Err(DiscoveryError::InvalidTopicSegment {
            declaration: declaration.clone(),
            segment: name.to_string(),
            reason: "sensor name has no usable characters for an object id",
        });
    }

    match node_id.map(slugify).filter(|node| !node.is_empty()) {
        Some(node) => Ok(format!("{node}_{name_slug}")),
        None => Ok(name_slug),
    }
}

/// Lowercase alphanumerics separated by single underscores
fn slugify(name: &str) -> String {
    let mut result = String::new();
    for c in name.chars() {
        if c.is_alphanumeric() {
            result.extend(c.to_lowercase());
        } else if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
    }
    result.trim_end_matches('_').to_string()
}
