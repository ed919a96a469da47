//! Test doubles shared by unit tests.

use crate::activity::{Activity, ConversationAccount};
use crate::adapter::{AdapterOptions, BotLogic, SmsAdapter, TurnContext};
use crate::provider::{ClientError, Provider, SmsClient, SmsJsonResponse, SmsMessage, SmsParams};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Records every send; answers with scripted ids (one list per call) or always fails.
pub struct RecordingClient {
    calls: Mutex<Vec<SmsParams>>,
    replies: Mutex<VecDeque<Vec<String>>>,
    fail: bool,
}

impl RecordingClient {
    pub fn with_ids(replies: Vec<Vec<&str>>) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|ids| ids.into_iter().map(String::from).collect())
                    .collect(),
            ),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
            fail: true,
        })
    }

    pub fn calls(&self) -> Vec<SmsParams> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SmsClient for RecordingClient {
    async fn sms(&self, params: &SmsParams) -> Result<SmsJsonResponse, ClientError> {
        self.calls.lock().unwrap().push(params.clone());
        if self.fail {
            return Err(ClientError::Api("503 Service Unavailable".to_string()));
        }
        let ids = self.replies.lock().unwrap().pop_front().unwrap_or_default();
        Ok(SmsJsonResponse {
            success: Some("100".to_string()),
            messages: ids
                .into_iter()
                .map(|id| SmsMessage {
                    id: Some(id),
                    recipient: Some(params.to.clone()),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        })
    }
}

/// Seven adapter for number 49700 whose client is `client`.
pub fn adapter_with(client: Arc<RecordingClient>) -> SmsAdapter {
    let provider = Provider::seven()
        .with_client_factory(move |_| Ok(client.clone() as Arc<dyn SmsClient>));
    SmsAdapter::new(provider, AdapterOptions::new("test-key", "49700")).unwrap()
}

pub fn message_to(phone: &str, text: &str) -> Activity {
    let mut a = Activity::message(text);
    a.conversation = Some(ConversationAccount::new(phone));
    a
}

/// Bot logic that records each activity and optionally answers, stages a reply, or fails.
#[derive(Default)]
pub struct RecordingLogic {
    pub seen: Mutex<Vec<Activity>>,
    pub answer: Option<String>,
    pub reply: Option<(u16, serde_json::Value)>,
    pub fail: bool,
}

impl RecordingLogic {
    pub fn activities(&self) -> Vec<Activity> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl BotLogic for RecordingLogic {
    async fn on_turn(&self, ctx: &mut TurnContext<'_>) -> anyhow::Result<()> {
        self.seen.lock().unwrap().push(ctx.activity().clone());
        if self.fail {
            anyhow::bail!("bot logic failed");
        }
        if let Some((status, ref body)) = self.reply {
            ctx.set_http_status(status);
            ctx.set_http_body(body.clone());
        }
        if let Some(ref text) = self.answer {
            ctx.send_text(text.clone()).await?;
        }
        Ok(())
    }
}
