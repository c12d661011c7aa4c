use async_trait::async_trait;

use super::{
    ACCESS_KEY_ID, Credentials, CredentialsProvider, ProviderProperties, SECRET_ACCESS_KEY,
    SESSION_TOKEN, optional_field, required_field,
};
use crate::errors::{BridgeError, Result};

/// A fixed access key and secret taken from configuration.
#[derive(Default)]
pub struct StaticKeysProvider {
    credentials: Option<Credentials>,
}

#[async_trait]
impl CredentialsProvider for StaticKeysProvider {
    fn configure(&mut self, properties: &ProviderProperties) -> Result<()> {
        self.credentials = Some(Credentials {
            access_key: required_field(properties, ACCESS_KEY_ID)?,
            secret_key: required_field(properties, SECRET_ACCESS_KEY)?,
            session_token: optional_field(properties, SESSION_TOKEN),
            expiry: None,
        });
        Ok(())
    }

    async fn resolve(&self) -> Result<Credentials> {
        self.credentials.clone().ok_or_else(|| {
            BridgeError::Configuration("static credentials provider is not configured".to_string())
        })
    }
}
