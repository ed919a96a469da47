//! SMS gateway HTTP client (seven.io and the legacy sms77.io endpoint share one API).

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

/// Value sent in the `SentWith` header so the gateway can attribute traffic.
const SENT_WITH: &str = "Botkit";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("sms gateway request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("sms gateway api error: {0}")]
    Api(String),
    #[error("api key must not be empty")]
    MissingApiKey,
}

/// Outbound SMS request: `{from, to, text, json: true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsParams {
    pub from: String,
    pub to: String,
    pub text: String,
    /// Ask the gateway for a JSON response (with per-message ids) instead of a bare status code.
    pub json: bool,
}

/// JSON response of the send endpoint. One request may yield several messages (multi-recipient).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsJsonResponse {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub success: Option<String>,
    #[serde(default)]
    pub total_price: Option<f64>,
    #[serde(default)]
    pub balance: Option<f64>,
    #[serde(default)]
    pub messages: Vec<SmsMessage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SmsMessage {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub parts: Option<u32>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_text: Option<String>,
}

/// Gateway ids arrive as JSON numbers or strings depending on endpoint and account; normalize to string.
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Send capability of the gateway. Stateless across calls (credentials only), so one instance is shared.
#[async_trait]
pub trait SmsClient: Send + Sync {
    async fn sms(&self, params: &SmsParams) -> Result<SmsJsonResponse, ClientError>;
}

/// reqwest-backed gateway client.
#[derive(Clone)]
pub struct GatewayClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, ClientError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(ClientError::MissingApiKey);
        }
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client: reqwest::Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl SmsClient for GatewayClient {
    /// POST /sms: send one SMS and return the per-message ids.
    async fn sms(&self, params: &SmsParams) -> Result<SmsJsonResponse, ClientError> {
        let url = format!("{}/sms", self.base_url);
        let res = self
            .client
            .post(&url)
            .header("X-Api-Key", &self.api_key)
            .header("SentWith", SENT_WITH)
            .json(params)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ClientError::Api(format!("{} {}", status, body)));
        }
        let data: SmsJsonResponse = res.json().await?;
        Ok(data)
    }
}
