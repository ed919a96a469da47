use crate::provider::ClientError;

/// Errors surfaced by the adapter, its turn pipeline and bot workers.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// A required option is missing.
    #[error("{field} is a required part of the configuration.")]
    Configuration { field: &'static str },

    /// The provider API client could not be built from the options.
    #[error("could not create the {provider} api client: {source}")]
    ClientInit {
        provider: &'static str,
        #[source]
        source: ClientError,
    },

    /// The adapter runs with an incomplete configuration and has no API client.
    #[error("{provider} api client is unavailable (adapter started with an incomplete configuration)")]
    ClientUnavailable { provider: &'static str },

    /// A message activity has no conversation id to deliver to.
    #[error("message activity has no conversation id")]
    MissingConversation,

    /// The worker has no conversation context; call start_conversation_with_user first.
    #[error("no active conversation on this worker")]
    NoActiveConversation,

    #[error("invalid webhook payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The gateway send call failed.
    #[error(transparent)]
    Transport(#[from] ClientError),

    /// Middleware or bot logic failed with an error not raised by the adapter.
    #[error(transparent)]
    Turn(anyhow::Error),
}

impl AdapterError {
    /// Unwrap adapter errors that travelled through the pipeline as `anyhow::Error`.
    pub(crate) fn from_turn(err: anyhow::Error) -> Self {
        match err.downcast::<AdapterError>() {
            Ok(e) => e,
            Err(other) => AdapterError::Turn(other),
        }
    }
}
