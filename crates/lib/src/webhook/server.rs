//! Webhook HTTP server: signature check, event dispatch, reply send.

use crate::config::{self, Config, Credentials};
use crate::line::LineClient;
use crate::reply::{self, CANCEL_KEYWORD};
use crate::signature;
use crate::suntimes::SunTimesClient;
use crate::webhook::payload::{EventMessage, InboundEvent, WebhookPayload};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state for the webhook (config, credentials, API clients).
#[derive(Clone)]
struct WebhookState {
    config: Arc<Config>,
    credentials: Credentials,
    line: LineClient,
    suntimes: SunTimesClient,
}

/// Run the webhook server; binds to config.webhook.bind:config.webhook.port.
/// Fails before binding when LINE credentials are missing. Blocks until shutdown
/// (e.g. Ctrl+C).
pub async fn run_webhook(config: Config) -> Result<()> {
    let credentials = Credentials::resolve(&config)?;
    let bind = config.webhook.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        log::info!("webhook binding to non-loopback address {}", bind);
    }

    let line = LineClient::new(
        credentials.channel_access_token.clone(),
        config.line.api_base.clone(),
    );
    let suntimes = SunTimesClient::new(config.suntimes.api_base.clone());
    let port = config.webhook.port;
    let state = WebhookState {
        config: Arc::new(config),
        credentials,
        line,
        suntimes,
    };

    let app = Router::new()
        .route("/", get(health_http))
        .route("/webhook", post(line_webhook))
        .with_state(state);

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("webhook listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("webhook server exited")?;
    log::info!("webhook stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// POST /webhook — verifies the LINE signature over the raw body, then processes
/// each event strictly in order. Always replies `{}`: 200 on success, 403 on
/// signature failure, 400 on an unparseable body, 500 when at least one reply
/// send failed (the batch still ran to completion).
async fn line_webhook(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<serde_json::Value>) {
    // HeaderMap lookup is case-insensitive, so both X-Line-Signature and
    // x-line-signature resolve here.
    let provided = headers
        .get("x-line-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !signature::verify(&state.credentials.channel_secret, &body, provided) {
        log::warn!("webhook: signature verification failed");
        return (StatusCode::FORBIDDEN, Json(json!({})));
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            log::warn!("webhook: unparseable payload: {}", e);
            return (StatusCode::BAD_REQUEST, Json(json!({})));
        }
    };

    log::info!("webhook: received {} event(s)", payload.events.len());
    let mut send_failed = false;
    for event in &payload.events {
        if let Err(e) = handle_event(&state, event).await {
            log::error!("webhook: reply send failed: {}", e);
            send_failed = true;
        }
    }

    if send_failed {
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({})));
    }
    (StatusCode::OK, Json(json!({})))
}

/// Process one event: route by message subtype, compose the reply, send it.
/// Returns Err only for reply-send failures. Skipped events (non-message
/// entries, unsupported subtypes, failed lookups, missing reply token) are Ok.
async fn handle_event(
    state: &WebhookState,
    event: &InboundEvent,
) -> Result<(), crate::line::LineError> {
    if event.typ != "message" {
        return Ok(());
    }
    let Some(ref message) = event.message else {
        return Ok(());
    };
    let Some(reply_token) = event.reply_token.as_deref() else {
        log::debug!("webhook: message event without replyToken, skipping");
        return Ok(());
    };

    let messages = match message {
        EventMessage::Location {
            latitude,
            longitude,
        } => match state.suntimes.lookup(*latitude, *longitude).await {
            Ok(times) => reply::location_reply(&times),
            Err(e) => {
                // Policy: a failed lookup drops the event; the user gets no fallback message.
                log::debug!("webhook: sun-times lookup failed, skipping event: {}", e);
                return Ok(());
            }
        },
        EventMessage::Text { text } => {
            if text == CANCEL_KEYWORD {
                reply::farewell_reply()
            } else {
                reply::prompt_reply()
            }
        }
        EventMessage::Other => return Ok(()),
    };

    state.line.reply(reply_token, &messages).await
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<WebhookState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.webhook.port,
    }))
}
