use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::AppError;
use crate::services::{conversation, dialog};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WhatsAppWebhookRequest {
    pub from: String,
    pub text: Option<String>,
    pub message_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub timestamp: Option<i64>,
}

#[derive(Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
}

/// Cloud API subscription handshake: echo the challenge when the verify
/// token matches.
pub async fn verify_webhook(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
) -> Response {
    if params.mode.as_deref() == Some("subscribe")
        && params.verify_token.as_deref() == Some(state.config.webhook_verify_token.as_str())
    {
        tracing::info!("webhook verified");
        return params.challenge.unwrap_or_default().into_response();
    }

    tracing::warn!("webhook verification failed");
    StatusCode::FORBIDDEN.into_response()
}

fn valid_signature(app_secret: &str, header: &str, body: &[u8]) -> bool {
    let signature = match header.strip_prefix("sha256=") {
        Some(s) => s,
        None => return false,
    };

    let mut mac = match Hmac::<Sha256>::new_from_slice(app_secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    let expected = hex::encode(mac.finalize().into_bytes());

    expected == signature
}

pub async fn receive_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    // Check payload authenticity (skip if no app secret is configured — dev mode)
    if !state.config.whatsapp_app_secret.is_empty() {
        let signature = headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !valid_signature(&state.config.whatsapp_app_secret, signature, &body) {
            tracing::warn!("invalid webhook signature");
            return Err(AppError::Unauthorized);
        }
    }

    let request: WhatsAppWebhookRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("invalid webhook payload: {e}")))?;

    let phone = request.from.trim().to_string();
    let text = request.text.unwrap_or_default().trim().to_string();

    tracing::info!(from = %phone, "incoming WhatsApp message");

    match conversation::process_message(&state, &phone, &text, request.message_id.as_deref()).await
    {
        Ok(reply) => {
            if !reply.is_empty() {
                if let Err(e) = state.notifier.send(&phone, &reply).await {
                    tracing::error!(error = %e, "failed to send reply");
                }
            }
            Ok(Json(serde_json::json!({ "status": "success" })).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, from = %phone, "message processing failed");
            let _ = state.notifier.send(&phone, dialog::apology_reply()).await;
            Ok((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "status": "error" })),
            )
                .into_response())
        }
    }
}
