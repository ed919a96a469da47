//! Bot worker: proactive messaging on top of an [`SmsAdapter`].
//!
//! Spawned via [`SmsAdapter::spawn`]; the adapter's spawn hook attaches the shared API client.

use crate::activity::{
    apply_conversation_reference, get_conversation_reference, Activity, ChannelAccount,
    ConversationAccount, ConversationReference, ResourceResponse,
};
use crate::adapter::{AdapterError, SmsAdapter};
use crate::provider::SmsClient;
use std::sync::Arc;

pub struct BotWorker {
    adapter: Arc<SmsAdapter>,
    api: Option<Arc<dyn SmsClient>>,
    reference: Option<ConversationReference>,
}

impl BotWorker {
    pub(crate) fn new(adapter: Arc<SmsAdapter>) -> Self {
        Self {
            adapter,
            api: None,
            reference: None,
        }
    }

    pub fn adapter(&self) -> &Arc<SmsAdapter> {
        &self.adapter
    }

    /// Gateway client attached when the worker was spawned.
    pub fn api(&self) -> Option<&Arc<dyn SmsClient>> {
        self.api.as_ref()
    }

    pub fn set_api(&mut self, api: Option<Arc<dyn SmsClient>>) {
        self.api = api;
    }

    /// Current conversation context, if any.
    pub fn reference(&self) -> Option<&ConversationReference> {
        self.reference.as_ref()
    }

    /// Switch the worker to another conversation.
    pub fn change_context(&mut self, reference: ConversationReference) -> &ConversationReference {
        self.reference.insert(reference)
    }

    /// Address the worker to `user_id` (a phone number like +491701234567). Sends nothing;
    /// follow with [`say`](Self::say).
    pub fn start_conversation_with_user(&mut self, user_id: &str) -> &ConversationReference {
        let provider = self.adapter.provider();
        let reference = ConversationReference {
            bot: Some(ChannelAccount {
                id: self.adapter.options().provider_number.clone(),
                name: Some("bot".to_string()),
            }),
            channel_id: provider.channel_id().to_string(),
            conversation: Some(ConversationAccount::new(user_id)),
            user: Some(ChannelAccount::new(user_id)),
            ..Default::default()
        };
        self.change_context(reference)
    }

    /// Send a text message into the current conversation.
    pub async fn say(&self, text: &str) -> Result<Vec<ResourceResponse>, AdapterError> {
        let reference = self
            .reference
            .as_ref()
            .ok_or(AdapterError::NoActiveConversation)?;
        let activity = apply_conversation_reference(Activity::message(text), reference, false);
        self.adapter.send_activities(vec![activity]).await
    }

    /// Answer an incoming activity in its own conversation.
    pub async fn reply(
        &self,
        incoming: &Activity,
        text: &str,
    ) -> Result<Vec<ResourceResponse>, AdapterError> {
        let reference = get_conversation_reference(incoming);
        let activity = apply_conversation_reference(Activity::message(text), &reference, false);
        self.adapter.send_activities(vec![activity]).await
    }
}
