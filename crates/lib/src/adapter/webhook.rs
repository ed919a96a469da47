//! Inbound SMS webhook payload (`{"webhook_event": "sms_mo", "data": {...}}`).

use crate::activity::{Activity, ActivityType, ChannelAccount, ConversationAccount};
use crate::provider::opt_string_or_number;
use serde::Deserialize;

/// Envelope POSTed by the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundWebhook {
    /// Kept raw so it can be passed through as channel data.
    pub data: serde_json::Value,
    #[serde(default)]
    pub webhook_event: Option<String>,
    #[serde(default)]
    pub webhook_timestamp: Option<serde_json::Value>,
}

/// Fields of an inbound SMS the adapter uses.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundSms {
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub id: Option<String>,
    /// Phone number of the remote party.
    pub sender: String,
    /// Receiving number of the account.
    pub system: String,
    /// Absent and `null` both read as no text.
    #[serde(default)]
    pub text: Option<String>,
    /// Receive time as sent by the gateway (unix seconds, number or string). Not interpreted.
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub time: Option<String>,
}

impl InboundWebhook {
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn sms(&self) -> Result<InboundSms, serde_json::Error> {
        InboundSms::deserialize(&self.data)
    }
}

impl InboundSms {
    /// Message activity for this SMS: conversation and sender are the remote number,
    /// recipient is the account number, channel data is the raw `data` object.
    pub fn to_activity(&self, channel_id: &str, channel_data: serde_json::Value) -> Activity {
        Activity {
            activity_type: ActivityType::Message,
            id: self.id.clone(),
            text: Some(self.text.clone().unwrap_or_default()),
            channel_id: Some(channel_id.to_string()),
            conversation: Some(ConversationAccount::new(&self.sender)),
            from: Some(ChannelAccount::new(&self.sender)),
            recipient: Some(ChannelAccount::new(&self.system)),
            timestamp: Some(chrono::Utc::now()),
            channel_data: Some(channel_data),
            ..Default::default()
        }
    }
}
