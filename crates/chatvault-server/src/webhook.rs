//! Webhook endpoint: signature check, event fan-out, acknowledgment.
//!
//! Delivery semantics are fire-and-acknowledge: once a request is
//! authenticated and parsed, handler failures are logged and the platform
//! still gets its 200, so one poison event cannot stall redelivery of the
//! channel. Only an invalid signature or an unparseable body is rejected.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use chatvault_line::{verify_signature, LineClient, WebhookRequest};
use chatvault_store::Database;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::handlers;
use crate::media::MediaStore;

/// Signature header attached to every platform delivery.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub line: Arc<LineClient>,
    pub store: Arc<Mutex<Database>>,
    pub media: Arc<MediaStore>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/callback", post(callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<&'static str, ServerError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(ServerError::SignatureInvalid)?;

    if !verify_signature(&state.config.channel_secret, &body, signature) {
        warn!("rejected webhook delivery with invalid signature");
        return Err(ServerError::SignatureInvalid);
    }

    let request: WebhookRequest = serde_json::from_slice(&body)
        .map_err(|e| ServerError::BadRequest(format!("malformed webhook body: {e}")))?;

    debug!(
        destination = %request.destination,
        events = request.events.len(),
        "accepted webhook delivery"
    );

    for event in &request.events {
        if let Err(e) = handlers::handle_event(&state, event).await {
            log_handler_error(&e);
        }
    }

    Ok("OK")
}

/// Surface a swallowed handler failure, including the platform's nested
/// error detail when the failure came from the Messaging API.
fn log_handler_error(err: &ServerError) {
    if let ServerError::Line(line_err) = err {
        if let Some(detail) = line_err.api_detail() {
            error!(message = %detail.message, "Messaging API rejected a call");
            for item in &detail.details {
                error!(
                    property = item.property.as_deref().unwrap_or("-"),
                    message = item.message.as_deref().unwrap_or("-"),
                    "API error detail"
                );
            }
            return;
        }
    }
    error!(error = %err, "event handler failed, delivery acknowledged anyway");
}

pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting webhook server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
