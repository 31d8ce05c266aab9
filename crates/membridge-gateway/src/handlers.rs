// SPDX-FileCopyrightText: 2026 Membridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Paths and body shapes match what existing browser extensions send.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use membridge_core::MembridgeError;
use membridge_pipeline::{AddMemory, IngestOutcome, IngestRequest};
use membridge_tools::ToolOutput;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ErrorResponse};
use crate::server::GatewayState;

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub status: String,
    pub oracle: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Body of `POST /api/search`.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub user_input: String,
    #[serde(default)]
    pub threshold: Option<f32>,
    #[serde(default)]
    pub n_results: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub memory_id: String,
    pub new_content: String,
    #[serde(default)]
    pub new_tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub memory_id: String,
}

/// `{status: "success", message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub message: String,
}

impl StatusResponse {
    fn success(message: String) -> Json<Self> {
        Json(Self {
            status: "success",
            message,
        })
    }
}

/// GET /
pub async fn get_root(State(state): State<GatewayState>) -> Result<Json<RootResponse>, ApiError> {
    Ok(Json(RootResponse {
        status: "running".to_string(),
        oracle: state.bridge.oracle_name().to_string(),
        count: state.bridge.count().await?,
    }))
}

/// GET /health
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /add_memory
pub async fn post_add_memory(
    State(state): State<GatewayState>,
    Json(body): Json<AddMemory>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = state.bridge.add_memory(body).await?;
    Ok(Json(serde_json::json!({ "status": "success", "data": { "id": id } })))
}

/// POST /api/search
pub async fn post_search(
    State(state): State<GatewayState>,
    Json(body): Json<SearchRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let results = state
        .bridge
        .search_memory(&body.user_input, body.threshold, body.n_results)
        .await?;
    Ok(Json(serde_json::json!({ "results": results })))
}

/// POST /api/update
pub async fn post_update(
    State(state): State<GatewayState>,
    Json(body): Json<UpdateRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state
        .bridge
        .update_memory(&body.memory_id, &body.new_content, body.new_tags)
        .await?;
    Ok(StatusResponse::success(format!("Memory {} updated", body.memory_id)))
}

/// POST /api/delete
pub async fn post_delete(
    State(state): State<GatewayState>,
    Json(body): Json<DeleteRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    state.bridge.delete_memory(&body.memory_id).await?;
    Ok(StatusResponse::success(format!("Memory {} deleted", body.memory_id)))
}

/// POST /api/gatekeeper/ingest
pub async fn post_ingest(
    State(state): State<GatewayState>,
    Json(body): Json<IngestRequest>,
) -> Result<Json<IngestOutcome>, ApiError> {
    Ok(Json(state.bridge.ingest(body).await?))
}

/// GET /v1/tools
pub async fn get_tools(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "tools": state.tools.tool_definitions() }))
}

/// POST /v1/tools/{name}
///
/// Tool failures come back as `200` with `is_error: true`.
pub async fn post_tool(
    State(state): State<GatewayState>,
    Path(name): Path<String>,
    Json(input): Json<serde_json::Value>,
) -> Response {
    match state.tools.invoke(&name, input).await {
        Some(output) => (StatusCode::OK, Json::<ToolOutput>(output)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: MembridgeError::Validation(format!("unknown tool: {name}")).to_string(),
            }),
        )
            .into_response(),
    }
}
