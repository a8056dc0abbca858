use super::{AppState, ErrorResponse};
use crate::agent::StatusReport;
use crate::api::dashboard::CityInfo;
use crate::city::{Hotspot, Scenario, SimulationEvent};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Request body for `PUT /api/run`
#[derive(Deserialize)]
pub struct RunRequest {
    pub running: bool,
}

/// Request body for `POST /api/scenario`
#[derive(Deserialize)]
pub struct ScenarioRequest {
    pub label: String,
}

/// Response for `POST /api/scenario`
#[derive(Serialize)]
pub struct ScenarioResponse {
    pub label: String,
    /// False when the label maps to no world event
    pub queued: bool,
}

/// Request body for `PUT /api/scenario/active`
#[derive(Deserialize)]
pub struct ActiveScenarioRequest {
    pub scenario: Option<Scenario>,
}

/// Response for `POST /api/hotspots/:id/signal`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalResponse {
    pub hotspot_id: String,
    pub severed: bool,
}

/// Request body for `POST /api/city`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchCityRequest {
    pub city_id: String,
}

/// Create operator intent router
pub fn create_intent_router(state: AppState) -> Router {
    Router::new()
        .route("/api/run", put(set_run))
        .route("/api/run/toggle", post(toggle_run))
        .route("/api/hotspots/selection", delete(clear_selection))
        .route("/api/hotspots/:id/select", post(select_hotspot))
        .route("/api/hotspots/:id/signal", post(toggle_signal))
        .route("/api/scenario", post(trigger_scenario))
        .route("/api/scenario/active", put(set_active_scenario))
        .route("/api/events", post(trigger_event))
        .route("/api/city", post(switch_city))
        .with_state(Arc::new(state))
}

/// PUT /api/run - Enable or disable run-control
async fn set_run(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RunRequest>,
) -> Json<StatusReport> {
    state.orchestrator.set_running(req.running).await;
    Json(state.orchestrator.status().await)
}

/// POST /api/run/toggle
async fn toggle_run(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    state.orchestrator.toggle_run().await;
    Json(state.orchestrator.status().await)
}

/// POST /api/hotspots/:id/select
async fn select_hotspot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Hotspot>, ApiError> {
    state
        .orchestrator
        .select_hotspot(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Hotspot not found: {}", id)))
}

/// DELETE /api/hotspots/selection
async fn clear_selection(State(state): State<Arc<AppState>>) -> StatusCode {
    state.orchestrator.clear_selection().await;
    StatusCode::NO_CONTENT
}

/// POST /api/hotspots/:id/signal - Sever or restore a camera link
async fn toggle_signal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<SignalResponse> {
    let severed = state.orchestrator.toggle_signal(&id).await;
    Json(SignalResponse {
        hotspot_id: id,
        severed,
    })
}

/// POST /api/scenario - Inject a scenario by label
async fn trigger_scenario(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScenarioRequest>,
) -> Result<Json<ScenarioResponse>, ApiError> {
    let label = req.label.trim();
    if label.is_empty() {
        return Err(ApiError::BadRequest("label must not be empty".to_string()));
    }

    let queued = state.orchestrator.trigger_scenario(label).await;
    Ok(Json(ScenarioResponse {
        label: label.to_string(),
        queued,
    }))
}

/// PUT /api/scenario/active - Set or clear the persistent scenario bias
async fn set_active_scenario(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActiveScenarioRequest>,
) -> StatusCode {
    state.orchestrator.set_active_scenario(req.scenario).await;
    StatusCode::NO_CONTENT
}

/// POST /api/events - Queue a fully specified event for the next tick
async fn trigger_event(
    State(state): State<Arc<AppState>>,
    Json(event): Json<SimulationEvent>,
) -> Result<StatusCode, ApiError> {
    if !event.severity.is_finite() {
        return Err(ApiError::BadRequest("severity must be a finite number".to_string()));
    }

    info!(kind = ?event.kind, severity = event.severity, "External event received");
    state.orchestrator.trigger_event(event).await;
    Ok(StatusCode::ACCEPTED)
}

/// POST /api/city - Switch the monitored city, resetting the session
async fn switch_city(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SwitchCityRequest>,
) -> Json<CityInfo> {
    let fixture = state.orchestrator.switch_city(&req.city_id).await;
    Json(CityInfo {
        id: fixture.id.to_string(),
        name: fixture.name.to_string(),
    })
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
