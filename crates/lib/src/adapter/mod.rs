//! SMS bot adapter: translates activities to gateway sends and inbound webhooks to turns.

mod error;
mod middleware;
mod options;
mod sms;
mod turn;
mod webhook;

pub use error::AdapterError;
pub use middleware::{BotLogic, Middleware, Next};
pub use options::{AdapterOptions, ValidatedOptions};
pub use sms::{SmsAdapter, SpawnHook};
pub use turn::{HttpReply, TurnContext};
pub use webhook::{InboundSms, InboundWebhook};
