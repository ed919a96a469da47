//! Channel-neutral activity model shared by the adapter, turn pipeline and worker.
//!
//! An [`Activity`] is the unit the bot logic sees; the adapter maps it to and from
//! gateway SMS payloads. A [`ConversationReference`] is the serializable handle
//! (user, bot, conversation, channel) used to resume or start a conversation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of activity. Only `Message` is delivered as SMS; everything else is skipped on send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityType {
    #[default]
    Message,
    Event,
    Typing,
    ConversationUpdate,
    #[serde(other)]
    Other,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Message => "message",
            ActivityType::Event => "event",
            ActivityType::Typing => "typing",
            ActivityType::ConversationUpdate => "conversationUpdate",
            ActivityType::Other => "other",
        }
    }
}

/// A user or bot on a channel. For SMS the id is a phone number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// Conversation on a channel. For SMS the id is the remote party's phone number.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationAccount {
    pub id: String,
}

impl ConversationAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Generic activity (message, event, ...). Fields are optional; senders fill what they know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Raw provider payload for inbound activities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
}

impl Activity {
    /// Outgoing text message with no addressing; apply a reference before sending.
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Message,
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Named event activity (e.g. "continueConversation").
    pub fn event(name: impl Into<String>) -> Self {
        Self {
            activity_type: ActivityType::Event,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Conversation id, if the activity is addressed.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation.as_ref().map(|c| c.id.as_str())
    }
}

/// Handle to a user/bot/conversation triple on a channel, used to resume a conversation later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationReference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot: Option<ChannelAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<ConversationAccount>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
}

/// Result of a successful send: the gateway's message id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResponse {
    pub id: String,
}

/// Build a reference from an incoming activity: the sender becomes the user, the recipient the bot.
pub fn get_conversation_reference(activity: &Activity) -> ConversationReference {
    ConversationReference {
        activity_id: activity.id.clone(),
        user: activity.from.clone(),
        bot: activity.recipient.clone(),
        conversation: activity.conversation.clone(),
        channel_id: activity.channel_id.clone().unwrap_or_default(),
        service_url: activity.service_url.clone(),
    }
}

/// Address an activity using a stored reference.
///
/// Incoming: `from` = user, `recipient` = bot, `id` = the referenced activity id (when set).
/// Outgoing: `from` = bot, `recipient` = user, `reply_to_id` = the referenced activity id.
pub fn apply_conversation_reference(
    mut activity: Activity,
    reference: &ConversationReference,
    is_incoming: bool,
) -> Activity {
    activity.channel_id = Some(reference.channel_id.clone());
    activity.service_url = reference.service_url.clone();
    activity.conversation = reference.conversation.clone();
    if is_incoming {
        activity.from = reference.user.clone();
        activity.recipient = reference.bot.clone();
        if let Some(ref id) = reference.activity_id {
            activity.id = Some(id.clone());
        }
    } else {
        activity.from = reference.bot.clone();
        activity.recipient = reference.user.clone();
        if let Some(ref id) = reference.activity_id {
            activity.reply_to_id = Some(id.clone());
        }
    }
    activity
}
