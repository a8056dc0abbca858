use super::{AppState, ErrorResponse};
use crate::agent::{CameraView, DashboardSnapshot, StatusReport};
use crate::city::{find_fixture, fixture_ids, CityState};
use crate::oracle::DecisionPacket;
use crate::recorder::LogEntry;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

/// Entry in `GET /api/cities`
#[derive(Serialize)]
pub struct CityInfo {
    pub id: String,
    pub name: String,
}

/// Create read-only dashboard router
pub fn create_dashboard_router(state: AppState) -> Router {
    Router::new()
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/state", get(get_state))
        .route("/api/logs", get(get_logs))
        .route("/api/packets", get(get_packets))
        .route("/api/packets/latest", get(get_latest_packet))
        .route("/api/status", get(get_status))
        .route("/api/cities", get(list_cities))
        .route("/api/camera", get(get_camera))
        .with_state(Arc::new(state))
}

/// GET /api/dashboard - Everything the operator view renders
async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    Json(state.orchestrator.dashboard().await)
}

/// GET /api/state - Rendered city snapshot
async fn get_state(State(state): State<Arc<AppState>>) -> Json<CityState> {
    Json(state.orchestrator.city_state().await)
}

/// GET /api/logs - Session log, oldest first
async fn get_logs(State(state): State<Arc<AppState>>) -> Json<Vec<LogEntry>> {
    Json(state.orchestrator.logs().await)
}

/// GET /api/packets - Decision packets of this session, oldest first
async fn get_packets(State(state): State<Arc<AppState>>) -> Json<Vec<DecisionPacket>> {
    Json(state.orchestrator.packets().await)
}

/// GET /api/packets/latest
async fn get_latest_packet(State(state): State<Arc<AppState>>) -> Response {
    match state.orchestrator.latest_packet().await {
        Some(packet) => Json(packet).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "No decision packet yet".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /api/status - Status, cycle count and run-control
async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    Json(state.orchestrator.status().await)
}

/// GET /api/cities - Selectable city presets
async fn list_cities() -> Json<Vec<CityInfo>> {
    let cities = fixture_ids()
        .iter()
        .filter_map(|id| find_fixture(id))
        .map(|fixture| CityInfo {
            id: fixture.id.to_string(),
            name: fixture.name.to_string(),
        })
        .collect();

    Json(cities)
}

/// GET /api/camera - Feed of the selected hotspot
async fn get_camera(State(state): State<Arc<AppState>>) -> Json<CameraView> {
    Json(state.orchestrator.camera_view().await)
}
