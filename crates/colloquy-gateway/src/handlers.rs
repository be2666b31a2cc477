// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! Handles POST/GET /v1/messages, POST /v1/commands, GET /health and
//! GET /metrics.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use colloquy_core::{
    GetMessages, HealthStatus, InboundCommand, Message, RequestContext, SendMessage, UserId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::server::GatewayState;

/// Request body for POST /v1/messages.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub from_user_id: String,
    pub to_user_id: String,
    pub text: String,
}

/// Response body for POST /v1/messages.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub message_id: i64,
}

/// Query string for GET /v1/messages.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetMessagesQuery {
    pub from_user_id: String,
    pub to_user_id: String,
}

/// One visible message.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub from_user_id: String,
    pub to_user_id: String,
    pub text: String,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        Self {
            from_user_id: m.from_user_id.0,
            to_user_id: m.to_user_id.0,
            text: m.text,
        }
    }
}

/// Response body for GET /v1/messages.
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub messages: Vec<MessageView>,
}

/// Response body for POST /v1/commands.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueResponse {
    pub delivery_id: i64,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, `degraded` or `unhealthy`.
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// POST /v1/messages
pub async fn post_message(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Response, ApiError> {
    let id = state
        .engine
        .send_message(
            &ctx,
            SendMessage {
                from: UserId::new(body.from_user_id),
                to: UserId::new(body.to_user_id),
                text: body.text,
            },
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse { message_id: id.0 }),
    )
        .into_response())
}

/// GET /v1/messages
///
/// Sent messages of the chat between the two users, newest first.
pub async fn get_messages(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<GetMessagesQuery>,
) -> Result<Json<MessageListResponse>, ApiError> {
    let messages = state
        .engine
        .get_messages(
            &ctx,
            GetMessages {
                from: UserId::new(query.from_user_id),
                to: UserId::new(query.to_user_id),
            },
        )
        .await?;
    Ok(Json(MessageListResponse {
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}

/// POST /v1/commands
///
/// Validates a commit/rollback envelope and stores it on the inbound queue.
/// The command is applied asynchronously by the intake workers.
pub async fn post_command(
    State(state): State<GatewayState>,
    Extension(ctx): Extension<RequestContext>,
    body: String,
) -> Result<Response, ApiError> {
    let command = InboundCommand::decode(&body)?;
    let delivery_id = state.commands.enqueue(&body).await?;
    debug!(
        request_id = %ctx.request_id,
        delivery_id,
        command = %command.kind,
        correlation_id = %command.command.correlation_id,
        "command accepted"
    );
    Ok((
        StatusCode::ACCEPTED,
        Json(EnqueueResponse { delivery_id }),
    )
        .into_response())
}

/// GET /health
///
/// Aggregates the registered adapters' health checks. Any unhealthy adapter
/// turns the response into a 503.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let mut status = "ok";
    for adapter in state.health.adapters.iter() {
        match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => {}
            Ok(HealthStatus::Degraded(reason)) => {
                warn!(adapter = adapter.name(), reason = %reason, "adapter degraded");
                if status == "ok" {
                    status = "degraded";
                }
            }
            Ok(HealthStatus::Unhealthy(reason)) => {
                warn!(adapter = adapter.name(), reason = %reason, "adapter unhealthy");
                status = "unhealthy";
            }
            Err(e) => {
                warn!(adapter = adapter.name(), error = %e, "health check failed");
                status = "unhealthy";
            }
        }
    }

    let code = if status == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    };
    (code, Json(body)).into_response()
}

/// GET /metrics
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_request_uses_camel_case() {
        let req: SendMessageRequest =
            serde_json::from_str(r#"{"fromUserId":"alice","toUserId":"bob","text":"hi"}"#)
                .unwrap();
        assert_eq!(req.from_user_id, "alice");
        assert_eq!(req.to_user_id, "bob");
    }

    #[test]
    fn responses_serialize_camel_case() {
        let json = serde_json::to_string(&SendMessageResponse { message_id: 7 }).unwrap();
        assert_eq!(json, r#"{"messageId":7}"#);
        let json = serde_json::to_string(&EnqueueResponse { delivery_id: 2 }).unwrap();
        assert_eq!(json, r#"{"deliveryId":2}"#);
    }
}
