use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sts::Client as StsClient;
use chrono::DateTime;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::{
    Credentials, CredentialsProvider, EXTERNAL_ID, ProviderProperties, REGION, ROLE_ARN,
    SESSION_NAME, optional_field, required_field,
};
use crate::errors::{BridgeError, Result};

#[derive(Debug, Clone)]
struct AssumeRoleSettings {
    role_arn: String,
    session_name: String,
    external_id: Option<String>,
    region: String,
}

/// Temporary credentials for a delegated role, obtained from STS.
///
/// The STS client is built once per provider instance, on first use, even
/// when several tasks resolve concurrently. Credentials themselves are
/// requested anew on every [`CredentialsProvider::resolve`].
#[derive(Default)]
pub struct AssumeRoleProvider {
    settings: Option<AssumeRoleSettings>,
    sts: OnceCell<StsClient>,
}

impl AssumeRoleProvider {
    fn settings(&self) -> Result<&AssumeRoleSettings> {
        self.settings.as_ref().ok_or_else(|| {
            BridgeError::Configuration("assume-role provider is not configured".to_string())
        })
    }

    /// The cached STS client, constructing it on first call.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the provider has not been configured.
    pub async fn sts_client(&self) -> Result<&StsClient> {
        let region = self.settings()?.region.clone();
        Ok(self
            .sts
            .get_or_init(|| async move {
                info!(region = %region, "Creating STS client for role assumption");
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region))
                    .load()
                    .await;
                StsClient::new(&shared)
            })
            .await)
    }
}

#[async_trait]
impl CredentialsProvider for AssumeRoleProvider {
    fn configure(&mut self, properties: &ProviderProperties) -> Result<()> {
        self.settings = Some(AssumeRoleSettings {
            role_arn: required_field(properties, ROLE_ARN)?,
            session_name: required_field(properties, SESSION_NAME)?,
            external_id: optional_field(properties, EXTERNAL_ID),
            region: required_field(properties, REGION)?,
        });
        Ok(())
    }

    async fn resolve(&self) -> Result<Credentials> {
        let settings = self.settings()?;
        let client = self.sts_client().await?;

        debug!(role_arn = %settings.role_arn, session = %settings.session_name, "Assuming role");
        let output = client
            .assume_role()
            .role_arn(&settings.role_arn)
            .role_session_name(&settings.session_name)
            .set_external_id(settings.external_id.clone())
            .send()
            .await
            .map_err(|e| {
                BridgeError::Credentials(format!(
                    "sts assume_role for {}: {}",
                    settings.role_arn,
                    DisplayErrorContext(&e)
                ))
            })?;

        let creds = output.credentials().ok_or_else(|| {
            BridgeError::Credentials(format!(
                "sts assume_role for {} returned no credentials",
                settings.role_arn
            ))
        })?;
        let expiration = creds.expiration();

        Ok(Credentials {
            access_key: creds.access_key_id().to_string(),
            secret_key: creds.secret_access_key().to_string(),
            session_token: Some(creds.session_token().to_string()),
            expiry: DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos()),
        })
    }
}
