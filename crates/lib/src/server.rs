//! Webhook HTTP server: the gateway POSTs inbound SMS here and gets the staged reply back.

use crate::adapter::{AdapterError, BotLogic, HttpReply, SmsAdapter};
use crate::config::Config;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the webhook routes.
#[derive(Clone)]
pub struct ServerState {
    pub adapter: Arc<SmsAdapter>,
    pub logic: Arc<dyn BotLogic>,
}

impl IntoResponse for HttpReply {
    fn into_response(self) -> Response {
        let status = match StatusCode::from_u16(self.status) {
            Ok(status) => status,
            Err(_) => {
                log::warn!("staged http status {} is invalid, replying 500", self.status);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        match self.body {
            None => status.into_response(),
            Some(serde_json::Value::String(text)) => (status, text).into_response(),
            Some(body) => (status, Json(body)).into_response(),
        }
    }
}

/// Routes: `GET /` health and `POST <webhook_path>` for inbound SMS.
/// The webhook path must start with `/` and must not be `/` itself.
pub fn router(
    adapter: Arc<SmsAdapter>,
    logic: Arc<dyn BotLogic>,
    webhook_path: &str,
) -> Result<Router> {
    if !webhook_path.starts_with('/') || webhook_path == "/" {
        anyhow::bail!(
            "invalid webhook path {:?}: must start with '/' and not be the root",
            webhook_path
        );
    }
    Ok(Router::new()
        .route("/", get(health_http))
        .route(webhook_path, post(sms_webhook))
        .with_state(ServerState { adapter, logic }))
}

/// Bind and serve until Ctrl+C / SIGTERM.
pub async fn run_server(
    config: &Config,
    adapter: Arc<SmsAdapter>,
    logic: Arc<dyn BotLogic>,
) -> Result<()> {
    let app = router(adapter, logic, &config.gateway.webhook_path)?;
    let bind_addr = format!("{}:{}", config.gateway.bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!(
        "webhook server listening on {}{}",
        bind_addr,
        config.gateway.webhook_path
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server exited")?;
    log::info!("webhook server stopped");
    Ok(())
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received");
}

/// POST <webhook_path>: runs the turn and writes back the staged status/body.
async fn sms_webhook(State(state): State<ServerState>, body: Bytes) -> Response {
    match state
        .adapter
        .process_activity(&body, state.logic.as_ref())
        .await
    {
        Ok(reply) => reply.into_response(),
        Err(AdapterError::InvalidPayload(e)) => {
            log::debug!("rejecting webhook body: {}", e);
            StatusCode::BAD_REQUEST.into_response()
        }
        Err(e) => {
            log::error!("webhook turn failed: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET / returns a simple health JSON (liveness checks).
async fn health_http(State(state): State<ServerState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "channel": state.adapter.provider().channel_id(),
        "degraded": state.adapter.is_degraded(),
    }))
}
