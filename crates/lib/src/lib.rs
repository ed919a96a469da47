//! smsbot: bot adapter for the seven / sms77 SMS gateway.
//!
//! Outbound message activities become gateway sends; inbound webhook POSTs become
//! turns run through the middleware pipeline. The webhook server and CLI build on this.

pub mod activity;
pub mod adapter;
pub mod config;
pub mod provider;
pub mod server;
pub mod worker;

#[cfg(test)]
mod testing;
