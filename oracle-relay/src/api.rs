//! Relay HTTP API.
//!
//! Exposes a single route:
//! - `POST /api/cycle` - turn a city state into a decision packet

use crate::gemini::GeminiClient;
use crate::prompt::build_cycle_prompt;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::post,
    Router,
};
use civicos::oracle::DecisionPacket;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

/// Shared state for the relay handlers.
#[derive(Clone)]
pub struct RelayState {
    pub gemini: Arc<GeminiClient>,
}

/// Request body for `POST /api/cycle`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleRequest {
    pub cycle_number: u64,
    #[serde(default)]
    pub city_state: Value,
    #[serde(default)]
    pub last_packet: Option<Value>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: String,
}

async fn post_cycle(
    State(state): State<Arc<RelayState>>,
    Json(req): Json<CycleRequest>,
) -> Result<Json<DecisionPacket>, AppError> {
    info!(cycle = req.cycle_number, "Decision cycle requested");

    let prompt = build_cycle_prompt(req.cycle_number, &req.city_state, req.last_packet.as_ref());
    let packet = state.gemini.generate_packet(&prompt).await?;

    info!(
        cycle = req.cycle_number,
        tool_calls = packet.tool_calls().len(),
        "Decision packet generated"
    );
    Ok(Json(packet))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

enum AppError {
    Internal(String),
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(format!("{:#}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Internal(details) = self;
        error!(error = %details, "Decision cycle failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: "Internal Server Error".to_string(),
                details,
            }),
        )
            .into_response()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn create_router(state: RelayState) -> Router {
    Router::new()
        .route("/api/cycle", post(post_cycle))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
