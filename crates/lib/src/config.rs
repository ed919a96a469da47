//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.smsbot/config.json`) and environment.
//! Gateway credentials from the environment (`SEVEN_API_KEY`, `SEVEN_NUMBER`, or the
//! `SMS77_*` pair for the sms77 provider) override the file.

use crate::adapter::AdapterOptions;
use crate::provider::{Provider, ProviderKind};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Webhook server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// SMS gateway account settings.
    #[serde(default)]
    pub sms: SmsConfig,
}

/// Webhook server bind, port and route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for the webhook HTTP server (default 3000).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Route the gateway POSTs inbound SMS to (default "/api/messages").
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

fn default_gateway_port() -> u16 {
    3000
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_webhook_path() -> String {
    "/api/messages".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            webhook_path: default_webhook_path(),
        }
    }
}

/// SMS gateway account.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsConfig {
    /// "seven" (default) or "sms77".
    #[serde(default)]
    pub provider: ProviderKind,
    /// API key. Overridden by SEVEN_API_KEY / SMS77_API_KEY.
    pub api_key: Option<String>,
    /// Outbound number of the bot. Overridden by SEVEN_NUMBER / SMS77_NUMBER.
    pub number: Option<String>,
    /// Start even if the api key or number is missing (degraded adapter).
    #[serde(default)]
    pub enable_incomplete: bool,
    /// Gateway base URL; defaults to the provider's public endpoint.
    pub base_url: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_or(var: &str, fallback: Option<&str>) -> Option<String> {
    non_empty(std::env::var(var).ok().as_deref()).or_else(|| non_empty(fallback))
}

/// Provider for the configured account, pointed at `baseUrl` when set.
pub fn resolve_provider(config: &Config) -> Provider {
    let provider = Provider::new(config.sms.provider);
    match non_empty(config.sms.base_url.as_deref()) {
        Some(url) => provider.with_base_url(url),
        None => provider,
    }
}

/// Adapter options from config with env overrides applied. Missing values become empty
/// strings so adapter validation reports them.
pub fn resolve_adapter_options(config: &Config, provider: &Provider) -> AdapterOptions {
    AdapterOptions {
        api_key: env_or(provider.api_key_env(), config.sms.api_key.as_deref()).unwrap_or_default(),
        provider_number: env_or(provider.number_env(), config.sms.number.as_deref())
            .unwrap_or_default(),
        enable_incomplete: config.sms.enable_incomplete,
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("SMSBOT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".smsbot").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or SMSBOT_CONFIG_PATH). Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
