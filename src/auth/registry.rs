use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{
    ASSUME_ROLE_PROVIDER, AssumeRoleProvider, CredentialsProvider, DEFAULT_PROVIDER,
    DefaultChainProvider, ProviderProperties, STATIC_PROVIDER, StaticKeysProvider,
};
use crate::errors::{BridgeError, Result};

pub type ProviderConstructor = fn() -> Box<dyn CredentialsProvider>;

/// Providers shipped with the crate.
pub static BUILTIN_PROVIDERS: Lazy<ProviderRegistry> = Lazy::new(ProviderRegistry::builtin);

fn default_chain() -> Box<dyn CredentialsProvider> {
    Box::new(DefaultChainProvider::default())
}

fn static_keys() -> Box<dyn CredentialsProvider> {
    Box::new(StaticKeysProvider::default())
}

fn assume_role() -> Box<dyn CredentialsProvider> {
    Box::new(AssumeRoleProvider::default())
}

/// Maps configuration names to provider constructors.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    constructors: HashMap<String, ProviderConstructor>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        registry.register(DEFAULT_PROVIDER, default_chain);
        registry.register(STATIC_PROVIDER, static_keys);
        registry.register(ASSUME_ROLE_PROVIDER, assume_role);
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, constructor: ProviderConstructor) {
        let name = name.into();
        if self.constructors.insert(name.clone(), constructor).is_some() {
            warn!(provider = %name, "Replacing registered credentials provider");
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Instantiates and configures the provider registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::ProviderLoad`] if the name is unknown or the
    /// provider rejects its configuration.
    pub fn load(
        &self,
        name: &str,
        properties: &ProviderProperties,
    ) -> Result<Arc<dyn CredentialsProvider>> {
        let constructor = self.constructors.get(name).ok_or_else(|| {
            BridgeError::provider_load(
                name,
                BridgeError::Configuration(format!("no credentials provider registered as '{name}'")),
            )
        })?;

        info!(provider = %name, "Loading credentials provider");
        let mut provider = constructor();
        provider
            .configure(properties)
            .map_err(|e| BridgeError::provider_load(name, e))?;
        Ok(Arc::from(provider))
    }
}
