//! REST API server for the portfolio advisor
//!
//! Exposes the chat turn handler over HTTP for the web frontend

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::advisor::Advisor;
use crate::error::AdvisorError;

/// =============================
/// Request / Response Models
/// =============================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub advisor: Arc<Advisor>,
}

/// =============================
/// Status Endpoints
/// =============================

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Chat Endpoint
/// =============================

fn error_response(err: AdvisorError) -> Response {
    let status = if err.is_client_error() {
        warn!("Rejected chat turn: {}", err);
        StatusCode::BAD_REQUEST
    } else {
        error!("Chat turn failed: {}", err);
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let detail = if err.is_client_error() {
        err.to_string()
    } else {
        format!("Error handling chat turn: {}", err)
    };

    (status, Json(ErrorResponse { detail })).into_response()
}

async fn chat_handler(State(state): State<ApiState>, Json(req): Json<ChatRequest>) -> Response {
    if req.session_id.trim().is_empty() {
        return error_response(AdvisorError::InvalidInput("session_id must not be empty".into()));
    }
    info!(session_id = %req.session_id, "Received chat turn");

    match state.advisor.handle_turn(&req.session_id, &req.message).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => error_response(e),
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(advisor: Arc<Advisor>) -> Router {
    let state = ApiState { advisor };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/chat", post(chat_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    advisor: Arc<Advisor>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(advisor);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);
    info!("Local: http://127.0.0.1:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
