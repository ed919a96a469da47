use super::middleware::Next;
use super::{
    AdapterError, AdapterOptions, BotLogic, HttpReply, InboundWebhook, Middleware, TurnContext,
    ValidatedOptions,
};
use crate::activity::{
    apply_conversation_reference, Activity, ActivityType, ConversationReference, ResourceResponse,
};
use crate::provider::{Provider, SmsClient, SmsParams};
use crate::worker::BotWorker;
use std::sync::Arc;

const INCOMPLETE_WARNING: &str = "\
****************************************************************************************
* WARNING: Your adapter may be running with an incomplete/unsafe configuration.        *
* - Ensure all required configuration options are present                              *
* - Disable the \"enable_incomplete\" option!                                            *
****************************************************************************************";

/// Hook run on every newly spawned [`BotWorker`].
pub type SpawnHook = Arc<dyn Fn(&mut BotWorker) + Send + Sync>;

/// Adapter between the bot and one SMS gateway account.
///
/// Outbound: message activities become gateway sends from the configured number.
/// Inbound: webhook bodies become message turns run through the middleware pipeline.
/// One instance lives for the whole process and shares a single API client across turns.
pub struct SmsAdapter {
    provider: Provider,
    options: AdapterOptions,
    api: Option<Arc<dyn SmsClient>>,
    problems: Vec<AdapterError>,
    middleware: Vec<Arc<dyn Middleware>>,
    spawn_hooks: Vec<SpawnHook>,
}

impl std::fmt::Debug for SmsAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsAdapter")
            .field("provider", &self.provider)
            .field("options", &self.options)
            .field("has_api", &self.api.is_some())
            .field("problems", &self.problems)
            .finish_non_exhaustive()
    }
}

impl SmsAdapter {
    /// Validate options and build the API client.
    ///
    /// Missing options or a client that cannot be built fail construction, unless
    /// `enable_incomplete` is set: then each problem is logged, kept in
    /// [`config_problems`](Self::config_problems), and the adapter starts degraded.
    pub fn new(provider: Provider, options: AdapterOptions) -> Result<Self, AdapterError> {
        let target = provider.log_target().to_string();
        let (options, mut problems) = match options.validate(&provider)? {
            ValidatedOptions::Complete(options) => (options, Vec::new()),
            ValidatedOptions::Incomplete { options, problems } => {
                for p in &problems {
                    log::error!(target: target.as_str(), "{}", p);
                }
                (options, problems)
            }
        };
        if options.enable_incomplete {
            log::warn!(target: target.as_str(), "\n{}", INCOMPLETE_WARNING);
        }

        let api = match provider.create_client(&options.api_key) {
            Ok(api) => Some(api),
            Err(source) => {
                let err = AdapterError::ClientInit {
                    provider: provider.name(),
                    source,
                };
                if !options.enable_incomplete {
                    return Err(err);
                }
                log::error!(target: target.as_str(), "{}", err);
                problems.push(err);
                None
            }
        };

        let hook_api = api.clone();
        let attach_api: SpawnHook =
            Arc::new(move |worker: &mut BotWorker| worker.set_api(hook_api.clone()));

        Ok(Self {
            provider,
            options,
            api,
            problems,
            middleware: Vec::new(),
            spawn_hooks: vec![attach_api],
        })
    }

    /// Name shown by plugin listings ("Seven SMS Adapter").
    pub fn name(&self) -> &'static str {
        self.provider.adapter_name()
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn options(&self) -> &AdapterOptions {
        &self.options
    }

    /// Shared API client; `None` when started degraded without one.
    pub fn api(&self) -> Option<&Arc<dyn SmsClient>> {
        self.api.as_ref()
    }

    /// True when started with `enable_incomplete` and something was missing.
    pub fn is_degraded(&self) -> bool {
        !self.problems.is_empty()
    }

    pub fn config_problems(&self) -> &[AdapterError] {
        &self.problems
    }

    fn log_target(&self) -> &str {
        self.provider.log_target()
    }

    /// Append a middleware; middleware run in registration order before the bot logic.
    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Register another hook run on every spawned worker.
    pub fn on_spawn<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut BotWorker) + Send + Sync + 'static,
    {
        self.spawn_hooks.push(Arc::new(hook));
        self
    }

    /// Create a worker bound to this adapter and run the spawn hooks on it.
    pub fn spawn(self: &Arc<Self>) -> BotWorker {
        let mut worker = BotWorker::new(Arc::clone(self));
        for hook in &self.spawn_hooks {
            hook(&mut worker);
        }
        worker
    }

    fn client(&self) -> Result<&Arc<dyn SmsClient>, AdapterError> {
        self.api.as_ref().ok_or(AdapterError::ClientUnavailable {
            provider: self.provider.name(),
        })
    }

    /// Gateway request for a message activity: from the configured number to the conversation id.
    fn activity_to_sms(&self, activity: &Activity) -> Result<SmsParams, AdapterError> {
        let to = activity
            .conversation_id()
            .ok_or(AdapterError::MissingConversation)?;
        Ok(SmsParams {
            from: self.options.provider_number.clone(),
            to: to.to_string(),
            text: activity.text.clone().unwrap_or_default(),
            json: true,
        })
    }

    /// Send activities in order. Each message activity is one gateway call; all message ids
    /// returned for it are appended. Other activity types are skipped. Gateway errors propagate.
    pub async fn send_activities(
        &self,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>, AdapterError> {
        let mut responses = Vec::new();
        for activity in activities {
            if activity.activity_type != ActivityType::Message {
                log::debug!(
                    target: self.log_target(),
                    "Unknown message type encountered in send_activities: {}",
                    activity.activity_type.as_str()
                );
                continue;
            }
            let params = self.activity_to_sms(&activity)?;
            log::debug!(target: self.log_target(), "sending sms to {}", params.to);
            let res = self.client()?.sms(&params).await?;
            responses.extend(res.messages.into_iter().map(|m| ResourceResponse {
                id: m.id.unwrap_or_default(),
            }));
        }
        Ok(responses)
    }

    /// SMS cannot be edited once sent; logs and returns.
    pub async fn update_activity(&self, _activity: &Activity) {
        log::debug!(
            target: self.log_target(),
            "{} SMS does not support updating activities.",
            self.provider.name()
        );
    }

    /// SMS cannot be recalled once sent; logs and returns.
    pub async fn delete_activity(&self, _reference: &ConversationReference) {
        log::debug!(
            target: self.log_target(),
            "{} SMS does not support deleting activities.",
            self.provider.name()
        );
    }

    /// Resume a stored conversation: run `logic` on a "continueConversation" event addressed
    /// with `reference`. No gateway call is made here.
    pub async fn continue_conversation(
        &self,
        reference: &ConversationReference,
        logic: &dyn BotLogic,
    ) -> Result<(), AdapterError> {
        let activity =
            apply_conversation_reference(Activity::event("continueConversation"), reference, true);
        let mut ctx = TurnContext::new(self, activity);
        self.run_middleware(&mut ctx, logic).await
    }

    /// Handle one webhook body: build the turn from `data`, run the pipeline, and return the
    /// status/body staged by middleware or logic (200 and no body unless changed).
    pub async fn process_activity(
        &self,
        body: &[u8],
        logic: &dyn BotLogic,
    ) -> Result<HttpReply, AdapterError> {
        let hook = InboundWebhook::parse(body)?;
        let sms = hook.sms()?;
        log::debug!(target: self.log_target(), "inbound sms from {}", sms.sender);
        let activity = sms.to_activity(self.provider.channel_id(), hook.data);
        let mut ctx = TurnContext::new(self, activity);
        self.run_middleware(&mut ctx, logic).await?;
        Ok(ctx.into_http_reply())
    }

    async fn run_middleware(
        &self,
        ctx: &mut TurnContext<'_>,
        logic: &dyn BotLogic,
    ) -> Result<(), AdapterError> {
        Next::new(&self.middleware, logic)
            .run(ctx)
            .await
            .map_err(AdapterError::from_turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::{ChannelAccount, ConversationAccount};
    use crate::testing::{adapter_with, message_to, RecordingClient, RecordingLogic};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const WEBHOOK: &[u8] = br#"{"webhook_event":"sms_mo","data":{"sender":"+491701234567","system":"49700","text":"hello","id":99}}"#;

    #[test]
    fn missing_number_fails_strict_construction() {
        let err = SmsAdapter::new(Provider::seven(), AdapterOptions::new("key", "")).unwrap_err();
        assert!(matches!(err, AdapterError::Configuration { field: "seven_number" }));
    }

    #[test]
    fn missing_key_fails_strict_construction() {
        let err = SmsAdapter::new(Provider::sms77(), AdapterOptions::new("", "49700")).unwrap_err();
        assert!(matches!(err, AdapterError::Configuration { field: "api_key" }));
    }

    #[test]
    fn incomplete_mode_starts_degraded() {
        let adapter =
            SmsAdapter::new(Provider::seven(), AdapterOptions::new("", "").incomplete()).unwrap();
        assert!(adapter.is_degraded());
        assert!(adapter.api().is_none());
        // number, api key, then the client that could not be built from an empty key
        assert_eq!(adapter.config_problems().len(), 3);
        assert!(matches!(
            adapter.config_problems()[2],
            AdapterError::ClientInit { provider: "Seven", .. }
        ));
    }

    #[test]
    fn client_init_failure_is_fatal_in_strict_mode() {
        let provider = Provider::seven()
            .with_client_factory(|_| Err(crate::provider::ClientError::Api("boom".into())));
        let err = SmsAdapter::new(provider, AdapterOptions::new("key", "49700")).unwrap_err();
        assert!(matches!(err, AdapterError::ClientInit { .. }));
    }

    #[tokio::test]
    async fn degraded_adapter_fails_fast_on_send() {
        let adapter =
            SmsAdapter::new(Provider::seven(), AdapterOptions::new("", "49700").incomplete())
                .unwrap();
        let err = adapter
            .send_activities(vec![message_to("+491701234567", "hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::ClientUnavailable { provider: "Seven" }));
    }

    #[tokio::test]
    async fn message_maps_to_one_gateway_call() {
        let client = RecordingClient::with_ids(vec![vec!["42"]]);
        let adapter = adapter_with(client.clone());
        let res = adapter
            .send_activities(vec![message_to("+491701234567", "hi")])
            .await
            .unwrap();
        assert_eq!(res, vec![ResourceResponse { id: "42".into() }]);
        assert_eq!(
            client.calls(),
            vec![SmsParams {
                from: "49700".into(),
                to: "+491701234567".into(),
                text: "hi".into(),
                json: true,
            }]
        );
    }

    #[tokio::test]
    async fn non_message_activities_are_skipped() {
        let client = RecordingClient::with_ids(vec![vec!["7"]]);
        let adapter = adapter_with(client.clone());
        let mut event = Activity::event("ping");
        event.conversation = Some(ConversationAccount::new("+491701234567"));
        let res = adapter
            .send_activities(vec![event, message_to("+491701234567", "hi")])
            .await
            .unwrap();
        assert_eq!(res, vec![ResourceResponse { id: "7".into() }]);
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn multi_part_ids_are_flattened_in_order() {
        let client = RecordingClient::with_ids(vec![vec!["1", "2"], vec!["3"]]);
        let adapter = adapter_with(client.clone());
        let res = adapter
            .send_activities(vec![message_to("+4911", "a"), message_to("+4922", "b")])
            .await
            .unwrap();
        let ids: Vec<_> = res.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        let to: Vec<_> = client.calls().into_iter().map(|p| p.to).collect();
        assert_eq!(to, vec!["+4911", "+4922"]);
    }

    #[tokio::test]
    async fn gateway_errors_propagate() {
        let client = RecordingClient::failing();
        let adapter = adapter_with(client.clone());
        let err = adapter
            .send_activities(vec![message_to("+491701234567", "hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::Transport(_)));
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn message_without_conversation_is_rejected() {
        let client = RecordingClient::with_ids(vec![]);
        let adapter = adapter_with(client.clone());
        let err = adapter
            .send_activities(vec![Activity::message("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::MissingConversation));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn update_and_delete_are_no_ops() {
        let client = RecordingClient::with_ids(vec![]);
        let adapter = adapter_with(client.clone());
        adapter.update_activity(&message_to("+4911", "x")).await;
        adapter.delete_activity(&ConversationReference::default()).await;
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn webhook_builds_message_turn() {
        let client = RecordingClient::with_ids(vec![]);
        let adapter = adapter_with(client.clone());
        let logic = RecordingLogic::default();
        let reply = adapter.process_activity(WEBHOOK, &logic).await.unwrap();
        assert_eq!(reply, HttpReply { status: 200, body: None });

        let seen = logic.activities();
        assert_eq!(seen.len(), 1);
        let a = &seen[0];
        assert_eq!(a.activity_type, ActivityType::Message);
        assert_eq!(a.conversation_id(), Some("+491701234567"));
        assert_eq!(a.from, Some(ChannelAccount::new("+491701234567")));
        assert_eq!(a.recipient, Some(ChannelAccount::new("49700")));
        assert_eq!(a.text.as_deref(), Some("hello"));
        assert_eq!(a.id.as_deref(), Some("99"));
        assert_eq!(a.channel_id.as_deref(), Some("seven-sms"));
        assert_eq!(a.channel_data.as_ref().unwrap()["system"], "49700");
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn logic_can_stage_status_and_body() {
        let adapter = adapter_with(RecordingClient::with_ids(vec![]));
        let logic = RecordingLogic {
            reply: Some((202, serde_json::json!({"ok": true}))),
            ..Default::default()
        };
        let reply = adapter.process_activity(WEBHOOK, &logic).await.unwrap();
        assert_eq!(reply.status, 202);
        assert_eq!(reply.body, Some(serde_json::json!({"ok": true})));
    }

    #[tokio::test]
    async fn reply_from_turn_goes_back_to_sender() {
        let client = RecordingClient::with_ids(vec![vec!["100"]]);
        let adapter = adapter_with(client.clone());
        let logic = RecordingLogic {
            answer: Some("got it".into()),
            ..Default::default()
        };
        adapter.process_activity(WEBHOOK, &logic).await.unwrap();
        assert_eq!(
            client.calls(),
            vec![SmsParams {
                from: "49700".into(),
                to: "+491701234567".into(),
                text: "got it".into(),
                json: true,
            }]
        );
    }

    #[tokio::test]
    async fn webhook_with_string_time_and_id_is_accepted() {
        let adapter = adapter_with(RecordingClient::with_ids(vec![]));
        let logic = RecordingLogic::default();
        let body = br#"{"webhook_event":"sms_mo","webhook_timestamp":1605878104,
            "data":{"id":"681590","sender":"+491701234567","system":"49700","text":"Hello","time":"1605878104"}}"#;
        let reply = adapter.process_activity(body, &logic).await.unwrap();
        assert_eq!(reply.status, 200);
        let seen = logic.activities();
        assert_eq!(seen[0].id.as_deref(), Some("681590"));
        assert_eq!(seen[0].text.as_deref(), Some("Hello"));
    }

    /// Records what the turn context reports before and after answering.
    #[derive(Default)]
    struct Inspect(Mutex<Vec<(bool, u16, &'static str)>>);

    #[async_trait]
    impl BotLogic for Inspect {
        async fn on_turn(&self, ctx: &mut TurnContext<'_>) -> anyhow::Result<()> {
            let channel = ctx.adapter().provider().channel_id();
            self.0
                .lock()
                .unwrap()
                .push((ctx.responded(), ctx.http_reply().status, channel));
            ctx.send_text("pong").await?;
            ctx.set_http_status(204);
            self.0
                .lock()
                .unwrap()
                .push((ctx.responded(), ctx.http_reply().status, channel));
            Ok(())
        }
    }

    #[tokio::test]
    async fn turn_context_tracks_responses_and_staged_status() {
        let adapter = adapter_with(RecordingClient::with_ids(vec![vec!["1"]]));
        let logic = Inspect::default();
        let reply = adapter.process_activity(WEBHOOK, &logic).await.unwrap();
        assert_eq!(
            *logic.0.lock().unwrap(),
            vec![(false, 200, "seven-sms"), (true, 204, "seven-sms")]
        );
        assert_eq!(reply, HttpReply { status: 204, body: None });
    }

    #[tokio::test]
    async fn malformed_webhook_is_invalid_payload() {
        let adapter = adapter_with(RecordingClient::with_ids(vec![]));
        let logic = RecordingLogic::default();
        let err = adapter.process_activity(b"not json", &logic).await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidPayload(_)));
        assert!(logic.activities().is_empty());
    }

    #[tokio::test]
    async fn continue_conversation_runs_event_turn() {
        let client = RecordingClient::with_ids(vec![]);
        let adapter = adapter_with(client.clone());
        let logic = RecordingLogic::default();
        let reference = ConversationReference {
            user: Some(ChannelAccount::new("+491701234567")),
            bot: Some(ChannelAccount::new("49700")),
            conversation: Some(ConversationAccount::new("+491701234567")),
            channel_id: "seven-sms".into(),
            ..Default::default()
        };
        adapter.continue_conversation(&reference, &logic).await.unwrap();
        let seen = logic.activities();
        assert_eq!(seen[0].activity_type, ActivityType::Event);
        assert_eq!(seen[0].name.as_deref(), Some("continueConversation"));
        assert_eq!(seen[0].from, Some(ChannelAccount::new("+491701234567")));
        assert_eq!(seen[0].conversation_id(), Some("+491701234567"));
        assert!(client.calls().is_empty());
    }

    struct Tag(&'static str, Arc<Mutex<Vec<&'static str>>>, bool);

    #[async_trait]
    impl Middleware for Tag {
        async fn on_turn(&self, ctx: &mut TurnContext<'_>, next: Next<'_>) -> anyhow::Result<()> {
            self.1.lock().unwrap().push(self.0);
            if self.2 {
                next.run(ctx).await
            } else {
                ctx.set_http_status(403);
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn middleware_runs_in_order_and_can_short_circuit() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let mut adapter = adapter_with(RecordingClient::with_ids(vec![]));
        adapter
            .use_middleware(Arc::new(Tag("first", order.clone(), true)))
            .use_middleware(Arc::new(Tag("second", order.clone(), false)));
        let logic = RecordingLogic::default();
        let reply = adapter.process_activity(WEBHOOK, &logic).await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(reply.status, 403);
        assert!(logic.activities().is_empty());
    }

    #[tokio::test]
    async fn pipeline_errors_propagate() {
        let adapter = adapter_with(RecordingClient::with_ids(vec![]));
        let logic = RecordingLogic {
            fail: true,
            ..Default::default()
        };
        let err = adapter.process_activity(WEBHOOK, &logic).await.unwrap_err();
        assert!(matches!(err, AdapterError::Turn(_)));

        let failing = adapter_with(RecordingClient::failing());
        let logic = RecordingLogic {
            answer: Some("x".into()),
            ..Default::default()
        };
        let err = failing.process_activity(WEBHOOK, &logic).await.unwrap_err();
        assert!(matches!(err, AdapterError::Transport(_)));
    }
}
