// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::future::Future;
use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use membridge_core::MembridgeError;
use membridge_pipeline::MemoryBridge;
use membridge_tools::{register_memory_tools, ToolRegistry};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AuthConfig};
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub bridge: Arc<MemoryBridge>,
    pub tools: Arc<ToolRegistry>,
}

impl GatewayState {
    /// State over `bridge` with the memory tools registered.
    pub fn new(bridge: Arc<MemoryBridge>) -> Self {
        let mut tools = ToolRegistry::new();
        register_memory_tools(&mut tools, bridge.clone());
        Self {
            bridge,
            tools: Arc::new(tools),
        }
    }
}

/// Bind address and auth for the gateway.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub auth: AuthConfig,
}

/// Build the router.
///
/// `/health` is always public; every other route goes through
/// [`auth_middleware`].
pub fn build_router(state: GatewayState, auth: AuthConfig) -> Router {
    let public_routes = Router::new().route("/health", get(handlers::get_health));

    let api_routes = Router::new()
        .route("/", get(handlers::get_root))
        .route("/add_memory", post(handlers::post_add_memory))
        .route("/api/search", post(handlers::post_search))
        .route("/api/update", post(handlers::post_update))
        .route("/api/delete", post(handlers::post_delete))
        .route("/api/gatekeeper/ingest", post(handlers::post_ingest))
        .route("/v1/tools", get(handlers::get_tools))
        .route("/v1/tools/{name}", post(handlers::post_tool))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve until `shutdown` resolves.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), MembridgeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state, config.auth.clone());

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        MembridgeError::transport(format!("failed to bind gateway to {addr}: {e}"), Some(Box::new(e)))
    })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| {
            MembridgeError::transport(format!("gateway server error: {e}"), Some(Box::new(e)))
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_config_debug_hides_token() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            auth: AuthConfig {
                bearer_token: Some("hunter2".into()),
            },
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("127.0.0.1"));
        assert!(!debug.contains("hunter2"));
    }
}
