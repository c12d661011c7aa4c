//! Credential resolution for the SQS client.
//!
//! Providers are looked up by name in a [`ProviderRegistry`] and wrapped in a
//! [`CredentialResolver`], which the AWS SDK calls whenever it needs to sign
//! a request:
//! - `default`: the platform default chain (environment, profile, web identity,
//!   container and instance metadata)
//! - `static`: a fixed access key and secret
//! - `assume-role`: temporary credentials from STS for a delegated role

mod assume_role;
mod default_chain;
mod registry;
mod resolver;
mod static_keys;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;

use crate::core::guard;
use crate::errors::{BridgeError, Result};

pub use assume_role::AssumeRoleProvider;
pub use default_chain::DefaultChainProvider;
pub use registry::{BUILTIN_PROVIDERS, ProviderConstructor, ProviderRegistry};
pub use resolver::CredentialResolver;
pub use static_keys::StaticKeysProvider;

pub const DEFAULT_PROVIDER: &str = "default";
pub const STATIC_PROVIDER: &str = "static";
pub const ASSUME_ROLE_PROVIDER: &str = "assume-role";

/// Provider sub-configuration keys (after the `sqs.credentials.provider.` prefix).
pub const ROLE_ARN: &str = "role.arn";
pub const SESSION_NAME: &str = "session.name";
pub const EXTERNAL_ID: &str = "external.id";
pub const REGION: &str = "region";
pub const ACCESS_KEY_ID: &str = "access.key.id";
pub const SECRET_ACCESS_KEY: &str = "secret.access.key";
pub const SESSION_TOKEN: &str = "session.token";

pub type ProviderProperties = BTreeMap<String, String>;

/// Resolved, short-lived credentials. Never persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
    pub expiry: Option<DateTime<Utc>>,
}

impl Credentials {
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry.is_some_and(|expiry| expiry <= now)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"** redacted **")
            .field("session_token", &self.session_token.as_ref().map(|_| "** redacted **"))
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl From<&aws_credential_types::Credentials> for Credentials {
    fn from(creds: &aws_credential_types::Credentials) -> Self {
        Self {
            access_key: creds.access_key_id().to_string(),
            secret_key: creds.secret_access_key().to_string(),
            session_token: creds.session_token().map(str::to_string),
            expiry: creds.expiry().map(DateTime::<Utc>::from),
        }
    }
}

impl From<Credentials> for aws_credential_types::Credentials {
    fn from(creds: Credentials) -> Self {
        aws_credential_types::Credentials::new(
            creds.access_key,
            creds.secret_key,
            creds.session_token,
            creds.expiry.map(SystemTime::from),
            "sqs-bridge",
        )
    }
}

/// Where credentials for the queue come from. Built once at task start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialsConfig {
    /// Registry name of the provider; `None` selects the default chain.
    pub provider: Option<String>,
    pub region: String,
    pub endpoint_override: Option<String>,
    /// Provider sub-configuration with the property prefix stripped.
    pub properties: ProviderProperties,
}

impl CredentialsConfig {
    #[must_use]
    pub fn provider_name(&self) -> &str {
        self.provider.as_deref().unwrap_or(DEFAULT_PROVIDER)
    }

    #[must_use]
    pub fn role_arn(&self) -> Option<&str> {
        self.properties.get(ROLE_ARN).map(String::as_str)
    }

    #[must_use]
    pub fn session_name(&self) -> Option<&str> {
        self.properties.get(SESSION_NAME).map(String::as_str)
    }

    #[must_use]
    pub fn external_id(&self) -> Option<&str> {
        self.properties.get(EXTERNAL_ID).map(String::as_str)
    }

    /// The map handed to [`CredentialsProvider::configure`]; the queue region
    /// is included unless the sub-configuration overrides it.
    #[must_use]
    pub fn provider_properties(&self) -> ProviderProperties {
        let mut properties = self.properties.clone();
        properties
            .entry(REGION.to_string())
            .or_insert_with(|| self.region.clone());
        properties
    }
}

/// A source of credentials, selected by name from configuration.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Called once with the provider sub-configuration before first use.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a required field is missing.
    fn configure(&mut self, _properties: &ProviderProperties) -> Result<()> {
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if credentials cannot be produced.
    async fn resolve(&self) -> Result<Credentials>;
}

pub(crate) fn required_field(properties: &ProviderProperties, name: &str) -> Result<String> {
    let value = properties.get(name).map(String::as_str);
    guard::verify_not_blank(value, name).map_err(|_| {
        BridgeError::Configuration(format!("The field '{name}' should not be null or empty"))
    })?;
    Ok(value.unwrap_or_default().trim().to_string())
}

pub(crate) fn optional_field(properties: &ProviderProperties, name: &str) -> Option<String> {
    properties
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
