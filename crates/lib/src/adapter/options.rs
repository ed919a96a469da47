//! Adapter options and their validation.

use super::AdapterError;
use crate::provider::Provider;
use serde::{Deserialize, Serialize};

/// Options for one adapter instance. Immutable once the adapter is built.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterOptions {
    /// API key of the gateway account.
    #[serde(default)]
    pub api_key: String,
    /// Outbound phone number (sender id) of this bot.
    #[serde(default, alias = "seven_number", alias = "sms77_number")]
    pub provider_number: String,
    /// Allow startup without a complete configuration. Missing options are logged instead of
    /// failing construction; the adapter may not work. Only meant for getting started.
    #[serde(default)]
    pub enable_incomplete: bool,
}

impl std::fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("provider_number", &self.provider_number)
            .field("enable_incomplete", &self.enable_incomplete)
            .finish()
    }
}

/// Outcome of validation: either everything required is present, or the caller opted into
/// running degraded and gets the list of problems instead of an error.
#[derive(Debug)]
pub enum ValidatedOptions {
    Complete(AdapterOptions),
    Incomplete {
        options: AdapterOptions,
        problems: Vec<AdapterError>,
    },
}

impl AdapterOptions {
    pub fn new(api_key: impl Into<String>, provider_number: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            provider_number: provider_number.into(),
            enable_incomplete: false,
        }
    }

    pub fn incomplete(mut self) -> Self {
        self.enable_incomplete = true;
        self
    }

    /// Check required fields (number first, then api key). In strict mode the first missing
    /// field is returned as an error; with `enable_incomplete` all problems are collected.
    pub fn validate(self, provider: &Provider) -> Result<ValidatedOptions, AdapterError> {
        let mut problems = Vec::new();
        if self.provider_number.trim().is_empty() {
            problems.push(AdapterError::Configuration {
                field: provider.number_field(),
            });
        }
        if self.api_key.trim().is_empty() {
            problems.push(AdapterError::Configuration { field: "api_key" });
        }
        if problems.is_empty() {
            return Ok(ValidatedOptions::Complete(self));
        }
        if !self.enable_incomplete {
            return Err(problems.remove(0));
        }
        Ok(ValidatedOptions::Incomplete {
            options: self,
            problems,
        })
    }
}

impl ValidatedOptions {
    pub fn options(&self) -> &AdapterOptions {
        match self {
            ValidatedOptions::Complete(o) => o,
            ValidatedOptions::Incomplete { options, .. } => options,
        }
    }
}
