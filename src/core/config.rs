use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::env;

use super::guard;
use super::models::QueueEndpoint;
use crate::auth::CredentialsConfig;
use crate::errors::{BridgeError, Result};

/// Connector property names.
pub mod keys {
    pub const QUEUE_URL: &str = "sqs.queue.url";
    pub const REGION: &str = "sqs.region";
    pub const ENDPOINT_URL: &str = "sqs.endpoint.url";
    pub const TOPICS: &str = "topics";
    pub const TOPICS_REGEX: &str = "topics.regex";
    pub const MAX_MESSAGES: &str = "sqs.max.messages";
    pub const WAIT_TIME_SECONDS: &str = "sqs.wait.time.seconds";
    pub const MESSAGE_ATTRIBUTES_ENABLED: &str = "sqs.message.attributes.enabled";
    pub const MESSAGE_ATTRIBUTES_INCLUDE_LIST: &str = "sqs.message.attributes.include.list";
    pub const MESSAGE_ATTRIBUTE_PARTITION_KEY: &str = "sqs.message.attributes.partition.key";
    pub const BODY_PARTITION_KEY_PATH: &str = "sqs.message.body.partition.key.path";
    pub const FAIL_ON_SEND_ERROR: &str = "sqs.sink.fail.on.send.error";
    pub const CREDENTIALS_PROVIDER_CLASS: &str = "sqs.credentials.provider.class";
    /// Prefix of the credentials provider sub-configuration (trailing '.').
    pub const CREDENTIALS_PROVIDER_PREFIX: &str = "sqs.credentials.provider.";
}

pub const DEFAULT_MAX_MESSAGES: i32 = 1;
pub const DEFAULT_WAIT_TIME_SECONDS: i32 = 1;
pub const MAX_MESSAGES_LIMIT: i32 = 10;

/// Flat connector properties, as handed over by the scheduler.
pub type Properties = HashMap<String, String>;

struct PropertyReader<'a> {
    props: &'a Properties,
}

impl<'a> PropertyReader<'a> {
    fn new(props: &'a Properties) -> Self {
        Self { props }
    }

    fn string(&self, key: &str) -> Option<String> {
        self.props
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn required(&self, key: &str) -> Result<String> {
        self.string(key)
            .ok_or_else(|| BridgeError::Configuration(format!("{key} is required")))
    }

    fn bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.string(key) {
            None => Ok(default),
            Some(v) if v.eq_ignore_ascii_case("true") => Ok(true),
            Some(v) if v.eq_ignore_ascii_case("false") => Ok(false),
            Some(v) => Err(BridgeError::Configuration(format!(
                "{key}: expected true or false, got '{v}'"
            ))),
        }
    }

    fn int(&self, key: &str, default: i32) -> Result<i32> {
        self.string(key).map_or(Ok(default), |v| {
            v.parse::<i32>()
                .map_err(|e| BridgeError::Configuration(format!("{key}: '{v}' is not an integer ({e})")))
        })
    }

    fn list(&self, key: &str) -> Vec<String> {
        self.string(key)
            .map(|v| {
                v.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    fn with_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
        self.props
            .iter()
            .filter_map(|(k, v)| k.strip_prefix(prefix).map(|rest| (rest.to_string(), v.clone())))
            .filter(|(k, _)| !k.is_empty())
            .collect()
    }
}

/// Settings shared by both directions.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub endpoint: QueueEndpoint,
    pub endpoint_override: Option<String>,
    pub credentials: CredentialsConfig,
    pub attributes_enabled: bool,
    /// Attribute or header names to map; empty means all.
    pub attribute_names: Vec<String>,
}

impl QueueSettings {
    fn from_reader(reader: &PropertyReader<'_>) -> Result<Self> {
        let queue_url = reader.required(keys::QUEUE_URL)?;
        let region = reader
            .string(keys::REGION)
            .or_else(|| env::var("AWS_REGION").ok().filter(|r| !guard::is_blank(r)))
            .ok_or_else(|| {
                BridgeError::Configuration(format!(
                    "{} is required when AWS_REGION is not set",
                    keys::REGION
                ))
            })?;
        let endpoint = QueueEndpoint::new(queue_url, region.clone())
            .map_err(|e| BridgeError::Configuration(format!("{}: {e}", keys::QUEUE_URL)))?;

        let endpoint_override = reader.string(keys::ENDPOINT_URL);
        if let Some(endpoint_url) = &endpoint_override {
            guard::verify_valid_url(endpoint_url)
                .map_err(|e| BridgeError::Configuration(format!("{}: {e}", keys::ENDPOINT_URL)))?;
        }

        let mut properties = reader.with_prefix(keys::CREDENTIALS_PROVIDER_PREFIX);
        properties.remove("class");
        let credentials = CredentialsConfig {
            provider: reader.string(keys::CREDENTIALS_PROVIDER_CLASS),
            region,
            endpoint_override: endpoint_override.clone(),
            properties,
        };

        let attributes_enabled = reader.bool(keys::MESSAGE_ATTRIBUTES_ENABLED, false)?;
        let attribute_names = if attributes_enabled {
            reader.list(keys::MESSAGE_ATTRIBUTES_INCLUDE_LIST)
        } else {
            Vec::new()
        };

        Ok(Self {
            endpoint,
            endpoint_override,
            credentials,
            attributes_enabled,
            attribute_names,
        })
    }

    #[must_use]
    pub fn queue_url(&self) -> &str {
        self.endpoint.url()
    }
}

#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub queue: QueueSettings,
    pub topic: String,
    pub max_messages: i32,
    pub wait_time_seconds: i32,
    pub partition_key_attribute: Option<String>,
    /// JSON pointer into the message body used as the record key when
    /// attributes are enabled.
    pub body_partition_key_path: Option<String>,
}

impl SourceConfig {
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid property.
    pub fn from_props(props: &Properties) -> Result<Self> {
        let reader = PropertyReader::new(props);
        let queue = QueueSettings::from_reader(&reader)?;
        let topic = reader.required(keys::TOPICS)?;
        if topic.contains(',') {
            return Err(BridgeError::Configuration(format!(
                "{}: the source writes to exactly one topic, got '{topic}'",
                keys::TOPICS
            )));
        }

        let max_messages = reader.int(keys::MAX_MESSAGES, DEFAULT_MAX_MESSAGES)?;
        guard::verify_in_range(max_messages, 0, MAX_MESSAGES_LIMIT, keys::MAX_MESSAGES)
            .map_err(|e| BridgeError::Configuration(e.to_string()))?;
        let wait_time_seconds = reader.int(keys::WAIT_TIME_SECONDS, DEFAULT_WAIT_TIME_SECONDS)?;
        guard::verify_non_negative(wait_time_seconds, keys::WAIT_TIME_SECONDS)
            .map_err(|e| BridgeError::Configuration(e.to_string()))?;

        let body_partition_key_path = reader.string(keys::BODY_PARTITION_KEY_PATH);
        if let Some(path) = &body_partition_key_path {
            if !path.starts_with('/') {
                return Err(BridgeError::Configuration(format!(
                    "{}: '{path}' is not a JSON pointer (expected a leading '/')",
                    keys::BODY_PARTITION_KEY_PATH
                )));
            }
        }

        Ok(Self {
            queue,
            topic,
            max_messages,
            wait_time_seconds,
            partition_key_attribute: reader.string(keys::MESSAGE_ATTRIBUTE_PARTITION_KEY),
            body_partition_key_path,
        })
    }
}

/// The topics a sink task consumes, for the log reader to subscribe with.
#[derive(Debug, Clone)]
pub enum TopicSelection {
    Topics(Vec<String>),
    Pattern(Regex),
}

impl TopicSelection {
    #[must_use]
    pub fn matches(&self, topic: &str) -> bool {
        match self {
            TopicSelection::Topics(topics) => topics.iter().any(|t| t == topic),
            TopicSelection::Pattern(pattern) => pattern.is_match(topic),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub queue: QueueSettings,
    pub topics: TopicSelection,
    pub fail_on_send_error: bool,
}

impl SinkConfig {
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid property.
    pub fn from_props(props: &Properties) -> Result<Self> {
        let reader = PropertyReader::new(props);
        let queue = QueueSettings::from_reader(&reader)?;

        let topics = match (reader.list(keys::TOPICS), reader.string(keys::TOPICS_REGEX)) {
            (topics, None) if !topics.is_empty() => TopicSelection::Topics(topics),
            (topics, Some(pattern)) if topics.is_empty() => {
                // Anchored so the pattern has to match the whole topic name.
                let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                    BridgeError::Configuration(format!("{}: {e}", keys::TOPICS_REGEX))
                })?;
                TopicSelection::Pattern(regex)
            }
            (_, None) => {
                return Err(BridgeError::Configuration(format!(
                    "one of {} or {} is required",
                    keys::TOPICS,
                    keys::TOPICS_REGEX
                )));
            }
            (_, Some(_)) => {
                return Err(BridgeError::Configuration(format!(
                    "{} and {} are mutually exclusive",
                    keys::TOPICS,
                    keys::TOPICS_REGEX
                )));
            }
        };

        Ok(Self {
            queue,
            topics,
            fail_on_send_error: reader.bool(keys::FAIL_ON_SEND_ERROR, false)?,
        })
    }
}

/// Maps `SQS_*` and `TOPICS*` environment variables to property names,
/// e.g. `SQS_QUEUE_URL` becomes `sqs.queue.url`.
pub fn props_from_env<I>(vars: I) -> Properties
where
    I: IntoIterator<Item = (String, String)>,
{
    vars.into_iter()
        .filter(|(name, _)| name.starts_with("SQS_") || name.starts_with("TOPICS"))
        .map(|(name, value)| (name.to_ascii_lowercase().replace('_', "."), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_drops_blank_entries() {
        let props = Properties::from([(
            keys::MESSAGE_ATTRIBUTES_INCLUDE_LIST.to_string(),
            " a, ,b ,".to_string(),
        )]);
        let reader = PropertyReader::new(&props);
        assert_eq!(reader.list(keys::MESSAGE_ATTRIBUTES_INCLUDE_LIST), vec!["a", "b"]);
    }

    #[test]
    fn prefix_is_stripped() {
        let props = Properties::from([
            ("sqs.credentials.provider.role.arn".to_string(), "arn:aws:iam::1:role/r".to_string()),
            ("sqs.region".to_string(), "us-east-1".to_string()),
        ]);
        let reader = PropertyReader::new(&props);
        let sub = reader.with_prefix(keys::CREDENTIALS_PROVIDER_PREFIX);
        assert_eq!(sub.len(), 1);
        assert_eq!(sub["role.arn"], "arn:aws:iam::1:role/r");
    }

    #[test]
    fn env_names_become_dotted_keys() {
        let props = props_from_env(vec![
            ("SQS_QUEUE_URL".to_string(), "https://q".to_string()),
            ("TOPICS_REGEX".to_string(), "orders.*".to_string()),
            ("HOME".to_string(), "/root".to_string()),
        ]);
        assert_eq!(props.len(), 2);
        assert_eq!(props["sqs.queue.url"], "https://q");
        assert_eq!(props["topics.regex"], "orders.*");
    }
}
