use aws_sdk_sqs::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Failed to load credentials provider '{name}': {source}")]
    ProviderLoad {
        name: String,
        #[source]
        source: Box<BridgeError>,
    },

    #[error("Failed to resolve AWS credentials: {0}")]
    Credentials(String),

    #[error("Failed to interact with SQS: {0}")]
    Transport(String),
}

impl BridgeError {
    /// Wraps a provider construction or configuration failure.
    pub fn provider_load(name: impl Into<String>, source: BridgeError) -> Self {
        BridgeError::ProviderLoad {
            name: name.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, BridgeError::Validation(_))
    }
}

// Generic implementation for AWS SDK errors
impl<E, R> From<SdkError<E, R>> for BridgeError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        BridgeError::Transport(DisplayErrorContext(&error).to_string())
    }
}
