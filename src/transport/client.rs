use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::Client;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

use super::{
    MessageQueue, attributes, fifo_ids, requested_attribute_names, validate_delete,
    validate_receive,
};
use crate::auth::{BUILTIN_PROVIDERS, CredentialResolver, CredentialsConfig, ProviderRegistry};
use crate::core::guard;
use crate::core::models::{AttributeValue, QueueEndpoint, QueueMessage};
use crate::errors::{BridgeError, Result};

/// The SQS client for one task, released exactly once by [`MessageQueue::close`].
#[derive(Debug)]
pub struct QueueTransport {
    client: Option<Client>,
    credentials: CredentialResolver,
}

fn verify_region(region: &str) -> Result<()> {
    guard::verify_not_blank(Some(region), "region")?;
    let well_formed = region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if !well_formed {
        return Err(BridgeError::Validation(format!("Invalid region: {region}")));
    }
    Ok(())
}

impl QueueTransport {
    /// Connects with the built-in credentials providers.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed region or endpoint override.
    pub async fn connect(endpoint: &QueueEndpoint, credentials: &CredentialsConfig) -> Result<Self> {
        Self::connect_with(endpoint, credentials, &BUILTIN_PROVIDERS).await
    }

    /// A provider that fails to load is logged and replaced by the default
    /// chain; every other construction failure is returned.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed region or endpoint override.
    pub async fn connect_with(
        endpoint: &QueueEndpoint,
        credentials: &CredentialsConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self> {
        let region = endpoint.region();
        verify_region(region)?;
        if let Some(endpoint_url) = &credentials.endpoint_override {
            guard::verify_valid_url(endpoint_url)?;
        }

        let resolver = match CredentialResolver::from_config(credentials, registry) {
            Ok(resolver) => resolver,
            Err(e @ BridgeError::ProviderLoad { .. }) => {
                error!(
                    error = %e,
                    "Problem initializing credentials provider, falling back to the default chain"
                );
                CredentialResolver::default_chain(region)
            }
            Err(e) => return Err(e),
        };

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(resolver.clone());
        if let Some(endpoint_url) = &credentials.endpoint_override {
            loader = loader.endpoint_url(endpoint_url);
        }
        let shared = loader.load().await;

        info!(
            queue_url = %endpoint.url(),
            region = %region,
            fifo = endpoint.is_fifo(),
            credentials_provider = %resolver.provider_name(),
            "SQS client created"
        );

        Ok(Self {
            client: Some(Client::new(&shared)),
            credentials: resolver,
        })
    }

    /// Name of the credentials provider actually in use.
    #[must_use]
    pub fn credentials_provider(&self) -> &str {
        self.credentials.provider_name()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.client.is_none()
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| BridgeError::IllegalState("SQS client is closed".to_string()))
    }
}

#[async_trait]
impl MessageQueue for QueueTransport {
    async fn send(
        &self,
        url: &str,
        body: &str,
        group_id: Option<&str>,
        dedup_id: Option<&str>,
        message_attributes: Option<&BTreeMap<String, AttributeValue>>,
    ) -> Result<String> {
        debug!(queue_url = %url, group_id = ?group_id, dedup_id = ?dedup_id, "send");
        guard::verify_valid_url(url)?;
        let fifo = fifo_ids(url, group_id, dedup_id)?;
        let client = self.client()?;

        let mut request = client.send_message().queue_url(url).message_body(body);
        for (name, value) in message_attributes.into_iter().flatten() {
            request = request.message_attributes(name, attributes::to_wire(value)?);
        }
        if let Some((group_id, dedup_id)) = fifo {
            request = request
                .message_group_id(group_id)
                .message_deduplication_id(dedup_id);
        }

        let output = request.send().await?;
        debug!(queue_url = %url, output = ?output, "send OK");

        let id = if fifo.is_some() {
            output.sequence_number()
        } else {
            output.message_id()
        };
        id.map(str::to_string).ok_or_else(|| {
            BridgeError::Transport(format!("SendMessage to {url} returned no identifier"))
        })
    }

    async fn receive(
        &self,
        url: &str,
        max_messages: i32,
        wait_time_seconds: i32,
        attributes_enabled: bool,
        attribute_names: &[String],
    ) -> Result<Vec<QueueMessage>> {
        debug!(queue_url = %url, max = max_messages, wait = wait_time_seconds, "receive");
        validate_receive(url, max_messages, wait_time_seconds)?;
        let client = self.client()?;

        let output = client
            .receive_message()
            .queue_url(url)
            .max_number_of_messages(max_messages)
            .wait_time_seconds(wait_time_seconds)
            .set_message_attribute_names(requested_attribute_names(
                attributes_enabled,
                attribute_names,
            ))
            .send()
            .await?;

        let messages: Vec<QueueMessage> = output
            .messages()
            .iter()
            .filter_map(attributes::message_from_wire)
            .collect();
        debug!(queue_url = %url, count = messages.len(), "receive OK");
        Ok(messages)
    }

    async fn delete(&self, url: &str, receipt_handle: &str) -> Result<()> {
        validate_delete(url, receipt_handle)?;
        let client = self.client()?;

        client
            .delete_message()
            .queue_url(url)
            .receipt_handle(receipt_handle)
            .send()
            .await?;
        debug!(queue_url = %url, receipt_handle = %receipt_handle, "delete OK");
        Ok(())
    }

    fn close(&mut self) -> bool {
        match self.client.take() {
            Some(_client) => {
                info!("SQS client closed.");
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_must_be_well_formed() {
        assert!(verify_region("us-east-1").is_ok());
        assert!(verify_region("").is_err());
        assert!(verify_region("US East 1").is_err());
    }
}
