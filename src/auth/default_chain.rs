use async_trait::async_trait;
use aws_config::Region;
use aws_config::default_provider::credentials::DefaultCredentialsChain;
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_sqs::error::DisplayErrorContext;
use tokio::sync::OnceCell;

use super::{Credentials, CredentialsProvider, ProviderProperties, REGION, optional_field};
use crate::errors::{BridgeError, Result};

/// The platform default credential chain, built on first use.
#[derive(Default)]
pub struct DefaultChainProvider {
    region: Option<String>,
    chain: OnceCell<DefaultCredentialsChain>,
}

impl DefaultChainProvider {
    #[must_use]
    pub fn for_region(region: &str) -> Self {
        Self {
            region: Some(region.to_string()),
            chain: OnceCell::new(),
        }
    }

    async fn chain(&self) -> &DefaultCredentialsChain {
        self.chain
            .get_or_init(|| async {
                let mut builder = DefaultCredentialsChain::builder();
                if let Some(region) = &self.region {
                    builder = builder.region(Region::new(region.clone()));
                }
                builder.build().await
            })
            .await
    }
}

#[async_trait]
impl CredentialsProvider for DefaultChainProvider {
    fn configure(&mut self, properties: &ProviderProperties) -> Result<()> {
        self.region = optional_field(properties, REGION);
        Ok(())
    }

    async fn resolve(&self) -> Result<Credentials> {
        let credentials = self
            .chain()
            .await
            .provide_credentials()
            .await
            .map_err(|e| BridgeError::Credentials(DisplayErrorContext(&e).to_string()))?;
        Ok(Credentials::from(&credentials))
    }
}
