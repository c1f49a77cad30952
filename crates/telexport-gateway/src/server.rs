// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state: the two tool endpoints
//! behind optional bearer auth, the artifact streaming route, and an
//! unauthenticated health probe.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;

use telexport_core::TelexportError;
use telexport_resource::ArtifactStore;

use crate::auth::{auth_middleware, AuthConfig};
use crate::exports;
use crate::tools::{FetchHistoryRequest, ResolveChatRequest, Toolkit};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// The tool façade.
    pub toolkit: Arc<Toolkit>,
    /// Artifact store for export streaming.
    pub store: Arc<ArtifactStore>,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

/// Gateway server configuration (mirrors `[server]` from telexport-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Build the gateway router.
///
/// - `POST /v1/tools/resolve_chat` (auth)
/// - `POST /v1/tools/fetch_history` (auth)
/// - `GET  /v1/exports/:id` (auth)
/// - `GET  /health` (public)
pub fn router(state: GatewayState) -> Router {
    let auth_state = state.auth.clone();

    let public_routes = Router::new()
        .route("/health", get(get_health))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/v1/tools/resolve_chat", post(post_resolve_chat))
        .route("/v1/tools/fetch_history", post(post_fetch_history))
        .route("/v1/exports/{id}", get(exports::get_export))
        .route_layer(axum_middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(CorsLayer::permissive())
}

/// Bind and serve until the shutdown token fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), TelexportError> {
    let app = router(state);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| TelexportError::Internal(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| TelexportError::Internal(format!("gateway server error: {e}")))?;

    Ok(())
}

/// POST /v1/tools/resolve_chat
async fn post_resolve_chat(
    State(state): State<GatewayState>,
    Json(request): Json<ResolveChatRequest>,
) -> Response {
    envelope_response(state.toolkit.resolve_chat(request).await)
}

/// POST /v1/tools/fetch_history
async fn post_fetch_history(
    State(state): State<GatewayState>,
    Json(request): Json<FetchHistoryRequest>,
) -> Response {
    envelope_response(state.toolkit.fetch_history(request).await)
}

/// GET /health
async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

fn envelope_response(envelope: crate::envelope::ToolResponse) -> Response {
    let status = StatusCode::from_u16(envelope.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok",
            version: "0.1.0",
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("\"version\":\"0.1.0\""));
    }

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8474,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(debug.contains("8474"));
    }
}
