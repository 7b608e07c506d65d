//! Line-oriented publisher for dry runs

use ha_discovery::{DiscoveryPublisher, PublishError};
use serde_json::json;
use std::io::Write;

/// Output format of [`StreamPublisher`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineFormat {
    /// `topic<TAB>payload`
    #[default]
    Tabbed,
    /// `{"topic": ..., "retain": ..., "payload": {...}}`
    Json,
}

/// Writes every published message as one line to a stream
pub struct StreamPublisher<W: Write> {
    writer: W,
    format: LineFormat,
}

impl<W: Write> StreamPublisher<W> {
    pub fn new(writer: W, format: LineFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> DiscoveryPublisher for StreamPublisher<W> {
    fn publish(&mut self, topic: &str, payload: &str, retain: bool) -> Result<(), PublishError> {
        let line = match self.format {
            LineFormat::Tabbed => format!("{topic}\t{payload}"),
            LineFormat::Json => {
                let payload: serde_json::Value = serde_json::from_str(payload)?;
                json!({ "topic": topic, "retain": retain, "payload": payload }).to_string()
            }
        };

        writeln!(self.writer, "{line}").map_err(|e| PublishError::Transport {
            topic: topic.to_string(),
            message: e.to_string(),
        })
    }
}
