//! Middleware pipeline: registered middleware run in order, then the bot logic.

use super::TurnContext;
use async_trait::async_trait;
use std::sync::Arc;

/// Bot logic run at the end of the pipeline.
#[async_trait]
pub trait BotLogic: Send + Sync {
    async fn on_turn(&self, ctx: &mut TurnContext<'_>) -> anyhow::Result<()>;
}

/// A pipeline stage. Call `next.run(ctx)` to continue; returning without it short-circuits
/// the rest of the pipeline (including the bot logic).
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn on_turn(&self, ctx: &mut TurnContext<'_>, next: Next<'_>) -> anyhow::Result<()>;
}

/// Continuation for the remaining middleware and the bot logic.
pub struct Next<'a> {
    rest: &'a [Arc<dyn Middleware>],
    logic: &'a dyn BotLogic,
}

impl<'a> Next<'a> {
    pub(crate) fn new(rest: &'a [Arc<dyn Middleware>], logic: &'a dyn BotLogic) -> Self {
        Self { rest, logic }
    }

    pub async fn run(self, ctx: &mut TurnContext<'_>) -> anyhow::Result<()> {
        match self.rest.split_first() {
            Some((first, rest)) => first.on_turn(ctx, Next::new(rest, self.logic)).await,
            None => self.logic.on_turn(ctx).await,
        }
    }
}
