use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::{ProvideCredentials, future};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use super::{
    CredentialsConfig, CredentialsProvider, Credentials, DEFAULT_PROVIDER, DefaultChainProvider,
    ProviderRegistry,
};
use crate::errors::Result;

/// Resolves credentials for one transport through the configured provider.
///
/// Cloning shares the provider, and with it any client the provider caches.
#[derive(Clone)]
pub struct CredentialResolver {
    name: String,
    provider: Arc<dyn CredentialsProvider>,
}

impl CredentialResolver {
    /// # Errors
    ///
    /// Returns [`crate::errors::BridgeError::ProviderLoad`] when the provider
    /// is unknown or rejects its configuration.
    pub fn from_config(config: &CredentialsConfig, registry: &ProviderRegistry) -> Result<Self> {
        let name = config.provider_name();
        let provider = registry.load(name, &config.provider_properties())?;
        Ok(Self {
            name: name.to_string(),
            provider,
        })
    }

    /// The platform default chain, used when nothing else is configured or
    /// when a configured provider fails to load.
    #[must_use]
    pub fn default_chain(region: &str) -> Self {
        Self {
            name: DEFAULT_PROVIDER.to_string(),
            provider: Arc::new(DefaultChainProvider::for_region(region)),
        }
    }

    pub fn with_provider(name: impl Into<String>, provider: Arc<dyn CredentialsProvider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    #[must_use]
    pub fn provider_name(&self) -> &str {
        &self.name
    }

    /// Fresh credentials on every call; providers decide what they cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot produce credentials.
    pub async fn resolve(&self) -> Result<Credentials> {
        debug!(provider = %self.name, "Resolving credentials");
        self.provider.resolve().await
    }
}

impl fmt::Debug for CredentialResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialResolver")
            .field("provider", &self.name)
            .finish_non_exhaustive()
    }
}

impl ProvideCredentials for CredentialResolver {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::new(async move {
            self.resolve()
                .await
                .map(aws_credential_types::Credentials::from)
                .map_err(CredentialsError::provider_error)
        })
    }
}
