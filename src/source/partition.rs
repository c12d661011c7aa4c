use serde_json::Value;

use crate::core::config::SourceConfig;
use crate::core::models::QueueMessage;

/// How the record key is chosen for a received message.
///
/// First match wins: the configured string attribute, then a scalar at the
/// body JSON pointer, then the message id. With attributes disabled both
/// rules are off and the message id is always the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionKeyStrategy {
    pub attribute: Option<String>,
    pub body_pointer: Option<String>,
}

impl PartitionKeyStrategy {
    #[must_use]
    pub fn from_config(config: &SourceConfig) -> Self {
        if !config.queue.attributes_enabled {
            return Self::default();
        }
        Self {
            attribute: config.partition_key_attribute.clone(),
            body_pointer: config.body_partition_key_path.clone(),
        }
    }

    #[must_use]
    pub fn key_for(&self, message: &QueueMessage) -> String {
        self.attribute
            .as_deref()
            .and_then(|name| message.string_attribute(name))
            .map(str::to_string)
            .or_else(|| {
                self.body_pointer
                    .as_deref()
                    .and_then(|pointer| body_key(&message.body, pointer))
            })
            .unwrap_or_else(|| message.id.clone())
    }
}

fn body_key(body: &str, pointer: &str) -> Option<String> {
    let document: Value = serde_json::from_str(body).ok()?;
    match document.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
