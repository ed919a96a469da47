//! SMS gateway providers.
//!
//! seven.io and its former brand sms77.io expose the same API; they differ only in naming,
//! channel id, option field name and default endpoint. A [`Provider`] carries those
//! differences plus the factory that builds the API client from an api key, so a single
//! adapter implementation serves both.

mod client;

pub use client::{ClientError, GatewayClient, SmsClient, SmsJsonResponse, SmsMessage, SmsParams};

pub(crate) use client::opt_string_or_number;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SEVEN_BASE_URL: &str = "https://gateway.seven.io/api";
const SMS77_BASE_URL: &str = "https://gateway.sms77.io/api";

/// Which gateway flavour to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Seven,
    Sms77,
}

/// Builds an API client from an api key.
pub type ClientFactory =
    Arc<dyn Fn(&str) -> Result<Arc<dyn SmsClient>, ClientError> + Send + Sync>;

/// Provider capability: naming, channel id, client factory and log target.
#[derive(Clone)]
pub struct Provider {
    kind: ProviderKind,
    factory: ClientFactory,
    log_target: String,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("kind", &self.kind)
            .field("log_target", &self.log_target)
            .finish_non_exhaustive()
    }
}

impl Provider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            factory: gateway_factory(kind.default_base_url()),
            log_target: format!("smsbot::{}", kind.slug()),
        }
    }

    pub fn seven() -> Self {
        Self::new(ProviderKind::Seven)
    }

    pub fn sms77() -> Self {
        Self::new(ProviderKind::Sms77)
    }

    /// Point the default reqwest client at another endpoint (proxy, mock gateway).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.factory = gateway_factory(&base_url.into());
        self
    }

    /// Replace the client factory entirely.
    pub fn with_client_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> Result<Arc<dyn SmsClient>, ClientError> + Send + Sync + 'static,
    {
        self.factory = Arc::new(factory);
        self
    }

    /// Log target used by adapters built for this provider.
    pub fn with_log_target(mut self, target: impl Into<String>) -> Self {
        self.log_target = target.into();
        self
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn log_target(&self) -> &str {
        &self.log_target
    }

    /// Human name used in log lines ("Seven SMS does not support ...").
    pub fn name(&self) -> &'static str {
        match self.kind {
            ProviderKind::Seven => "Seven",
            ProviderKind::Sms77 => "Sms77",
        }
    }

    pub fn adapter_name(&self) -> &'static str {
        match self.kind {
            ProviderKind::Seven => "Seven SMS Adapter",
            ProviderKind::Sms77 => "Sms77 SMS Adapter",
        }
    }

    /// Channel id stamped on every activity from this provider.
    pub fn channel_id(&self) -> &'static str {
        match self.kind {
            ProviderKind::Seven => "seven-sms",
            ProviderKind::Sms77 => "sms77-sms",
        }
    }

    /// Name of the outbound-number option, as users write it in configuration.
    pub fn number_field(&self) -> &'static str {
        match self.kind {
            ProviderKind::Seven => "seven_number",
            ProviderKind::Sms77 => "sms77_number",
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self.kind {
            ProviderKind::Seven => "SEVEN_API_KEY",
            ProviderKind::Sms77 => "SMS77_API_KEY",
        }
    }

    pub fn number_env(&self) -> &'static str {
        match self.kind {
            ProviderKind::Seven => "SEVEN_NUMBER",
            ProviderKind::Sms77 => "SMS77_NUMBER",
        }
    }

    pub fn create_client(&self, api_key: &str) -> Result<Arc<dyn SmsClient>, ClientError> {
        (self.factory)(api_key)
    }
}

impl ProviderKind {
    fn slug(&self) -> &'static str {
        match self {
            ProviderKind::Seven => "seven",
            ProviderKind::Sms77 => "sms77",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderKind::Seven => SEVEN_BASE_URL,
            ProviderKind::Sms77 => SMS77_BASE_URL,
        }
    }
}

fn gateway_factory(base_url: &str) -> ClientFactory {
    let base_url = base_url.to_string();
    Arc::new(move |api_key: &str| -> Result<Arc<dyn SmsClient>, ClientError> {
        let client = GatewayClient::new(api_key, &base_url)?;
        Ok(Arc::new(client) as Arc<dyn SmsClient>)
    })
}
