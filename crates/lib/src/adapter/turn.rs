//! Per-turn context: the activity being handled plus the staged HTTP reply.

use super::{AdapterError, SmsAdapter};
use crate::activity::{
    apply_conversation_reference, get_conversation_reference, Activity, ConversationReference,
    ResourceResponse,
};

/// HTTP status and body staged by middleware or bot logic while handling a webhook.
/// Written back to the gateway once the pipeline finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub body: Option<serde_json::Value>,
}

impl Default for HttpReply {
    fn default() -> Self {
        Self {
            status: 200,
            body: None,
        }
    }
}

/// Execution context of one turn. Created fresh per webhook call or continuation and
/// dropped once the reply is written.
pub struct TurnContext<'a> {
    adapter: &'a SmsAdapter,
    activity: Activity,
    reply: HttpReply,
    responded: bool,
}

impl<'a> TurnContext<'a> {
    pub(crate) fn new(adapter: &'a SmsAdapter, activity: Activity) -> Self {
        Self {
            adapter,
            activity,
            reply: HttpReply::default(),
            responded: false,
        }
    }

    pub fn adapter(&self) -> &SmsAdapter {
        self.adapter
    }

    /// The incoming activity.
    pub fn activity(&self) -> &Activity {
        &self.activity
    }

    /// True once anything has been sent during this turn.
    pub fn responded(&self) -> bool {
        self.responded
    }

    pub fn http_reply(&self) -> &HttpReply {
        &self.reply
    }

    pub fn set_http_status(&mut self, status: u16) {
        self.reply.status = status;
    }

    pub fn set_http_body(&mut self, body: impl Into<serde_json::Value>) {
        self.reply.body = Some(body.into());
    }

    pub(crate) fn into_http_reply(self) -> HttpReply {
        self.reply
    }

    /// Reference to the conversation this turn belongs to.
    pub fn conversation_reference(&self) -> ConversationReference {
        get_conversation_reference(&self.activity)
    }

    /// Address `activity` back to the sender of this turn and send it.
    pub async fn send_activity(
        &mut self,
        activity: Activity,
    ) -> Result<Vec<ResourceResponse>, AdapterError> {
        let reference = self.conversation_reference();
        let activity = apply_conversation_reference(activity, &reference, false);
        let responses = self.adapter.send_activities(vec![activity]).await?;
        self.responded = true;
        Ok(responses)
    }

    /// Reply with a plain text message.
    pub async fn send_text(
        &mut self,
        text: impl Into<String>,
    ) -> Result<Vec<ResourceResponse>, AdapterError> {
        self.send_activity(Activity::message(text)).await
    }
}
