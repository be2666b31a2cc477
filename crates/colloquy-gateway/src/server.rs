// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use colloquy_core::{ColloquyError, PluginAdapter};
use colloquy_engine::DialogueEngine;
use colloquy_storage::SqliteCommandSource;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::request_context;

/// State for the unauthenticated health/metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
    /// Adapters consulted by `GET /health`.
    pub adapters: Arc<Vec<Arc<dyn PluginAdapter>>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub engine: DialogueEngine,
    /// Inbound queue `POST /v1/commands` writes to.
    pub commands: Arc<SqliteCommandSource>,
    pub health: HealthState,
}

/// Gateway server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Build the gateway router:
/// - POST /v1/messages, GET /v1/messages
/// - POST /v1/commands
/// - GET /health, GET /metrics
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/v1/messages",
            post(handlers::post_message).get(handlers::get_messages),
        )
        .route("/v1/commands", post(handlers::post_command))
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .layer(axum_middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), ColloquyError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        ColloquyError::Internal(format!("failed to bind gateway to {addr}: {e}"))
    })?;
    serve(listener, state, cancel).await
}

/// Serve on an already bound listener until `cancel` fires.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(
    listener: TcpListener,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), ColloquyError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("gateway listening on {addr}");
    }

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await
        .map_err(|e| ColloquyError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode};
    use colloquy_core::{
        CommandKind, CorrelationId, InboundCommand, MessageCommand, RequestContext, SendMessage,
        UserId,
    };
    use colloquy_storage::Database;
    use colloquy_storage::InboxStatus;
    use colloquy_storage::queries::inbox;
    use tower::ServiceExt;

    use crate::middleware::REQUEST_ID_HEADER;

    struct Fixture {
        state: GatewayState,
        db: Database,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("gw.db").to_str().unwrap())
            .await
            .unwrap();
        let commands = Arc::new(SqliteCommandSource::new(
            db.clone(),
            Duration::from_secs(60),
            5,
        ));
        let state = GatewayState {
            engine: DialogueEngine::new(db.clone()),
            commands: commands.clone(),
            health: HealthState {
                start_time: std::time::Instant::now(),
                prometheus_render: None,
                adapters: Arc::new(vec![commands as Arc<dyn PluginAdapter>]),
            },
        };
        Fixture {
            state,
            db,
            _dir: dir,
        }
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn post_message_returns_created_with_id() {
        let f = fixture().await;
        let mut request = post_json(
            "/v1/messages",
            serde_json::json!({"fromUserId": "alice", "toUserId": "bob", "text": "hi"}),
        );
        request
            .headers_mut()
            .insert(REQUEST_ID_HEADER, "req-42".parse().unwrap());

        let response = build_router(f.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-42");
        let body = body_json(response).await;
        assert!(body["messageId"].as_i64().unwrap() > 0);
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn empty_user_is_bad_request() {
        let f = fixture().await;
        let request = post_json(
            "/v1/messages",
            serde_json::json!({"fromUserId": "", "toUserId": "bob", "text": "hi"}),
        );
        let response = build_router(f.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("must not be empty"));
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn control_character_in_user_is_bad_request() {
        let f = fixture().await;
        let request = post_json(
            "/v1/messages",
            serde_json::json!({"fromUserId": "alice", "toUserId": "jo\nse", "text": "hi"}),
        );
        let response = build_router(f.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("control characters"));
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_messages_lists_committed_only() {
        let f = fixture().await;
        let ctx = RequestContext::new("test");
        let send = |text: &str| SendMessage {
            from: UserId::new("alice"),
            to: UserId::new("bob"),
            text: text.into(),
        };
        let committed = f.state.engine.send_message(&ctx, send("visible")).await.unwrap();
        f.state.engine.send_message(&ctx, send("pending")).await.unwrap();
        f.state
            .engine
            .commit_message(
                &ctx,
                MessageCommand {
                    correlation_id: CorrelationId("c1".into()),
                    message_id: committed,
                },
            )
            .await
            .unwrap();

        let request = Request::builder()
            .uri("/v1/messages?fromUserId=bob&toUserId=alice")
            .body(Body::empty())
            .unwrap();
        let response = build_router(f.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(
            body,
            serde_json::json!({"messages": [
                {"fromUserId": "alice", "toUserId": "bob", "text": "visible"}
            ]})
        );
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn post_command_enqueues_valid_envelope() {
        let f = fixture().await;
        let envelope = InboundCommand::new(
            CommandKind::Rollback,
            CorrelationId("r-1".into()),
            colloquy_core::MessageId(5),
        )
        .encode()
        .unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/v1/commands")
            .header("content-type", "application/json")
            .body(Body::from(envelope.clone()))
            .unwrap();

        let response = build_router(f.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let delivery_id = body_json(response).await["deliveryId"].as_i64().unwrap();

        let entry = inbox::get_entry(&f.db, delivery_id).await.unwrap().unwrap();
        assert_eq!(entry.status, InboxStatus::Pending);
        assert_eq!(entry.payload, envelope);
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn post_command_rejects_unknown_command() {
        let f = fixture().await;
        let request = post_json(
            "/v1/commands",
            serde_json::json!({
                "correlationId": "x",
                "command": "DeleteEverything",
                "payload": {"messageId": 1}
            }),
        );
        let response = build_router(f.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            inbox::count_by_status(&f.db, InboxStatus::Pending).await.unwrap(),
            0
        );
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let f = fixture().await;
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = build_router(f.state.clone()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn metrics_endpoint_depends_on_renderer() {
        let mut f = fixture().await;
        let request = || Request::builder().uri("/metrics").body(Body::empty()).unwrap();

        let response = build_router(f.state.clone()).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        f.state.health.prometheus_render = Some(Arc::new(|| "colloquy_up 1\n".to_string()));
        let response = build_router(f.state.clone()).oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"colloquy_up 1\n");
        f.db.close().await.unwrap();
    }

    #[tokio::test]
    async fn serve_stops_on_cancel() {
        let f = fixture().await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(serve(listener, f.state.clone(), cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("gateway should stop promptly")
            .unwrap()
            .unwrap();
        f.db.close().await.unwrap();
    }
}
