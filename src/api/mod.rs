// HTTP and WebSocket APIs for the operator dashboard

pub mod dashboard;
pub mod intents;
pub mod websocket;

pub use dashboard::create_dashboard_router;
pub use intents::create_intent_router;
pub use websocket::{create_ws_router, ws_handler};

use crate::agent::Orchestrator;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;

/// Shared state for all dashboard handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
}

/// Error response
#[derive(Serialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
}

/// Full dashboard API: reads, intents and the log stream
pub fn create_router(orchestrator: Orchestrator) -> Router {
    let state = AppState { orchestrator };

    Router::new()
        .merge(create_dashboard_router(state.clone()))
        .merge(create_intent_router(state.clone()))
        .merge(create_ws_router(state))
        .layer(CorsLayer::permissive())
}
