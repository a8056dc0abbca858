use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of a simulated city at one instant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CityState {
    /// Refreshed once per tick
    pub timestamp: DateTime<Utc>,
    pub weather: Weather,
    pub metrics: Metrics,
    /// Order is stable for UI indexing only
    pub hotspots: Vec<Hotspot>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub condition: String,
    pub temperature: f64,
    pub precipitation: f64,
}

/// City gauges. The four percentage gauges live in [0, 100];
/// `safety_incidents` is an unbounded count.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub congestion_index: f64,
    pub ems_load: f64,
    pub transit_on_time: f64,
    pub safety_incidents: u32,
    pub power_grid_load: f64,
}

/// A monitored geographic point of interest
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub id: String,
    pub name: String,
    /// [lat, lng]
    pub location: [f64; 2],
    pub status: HotspotStatus,
    pub reason: String,
    /// None means no visual feed is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_asset_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HotspotStatus {
    Normal,
    Warning,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Weather,
    Incident,
    SystemFailure,
}

/// Queued perturbation, drained on the next tick
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// 0-100
    pub severity: f64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
}

/// Persistent perturbation biasing every tick until cleared
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scenario {
    Storm,
}

/// Input accepted by `CitySimulation::trigger_external_event`
#[derive(Clone, Debug)]
pub enum EventTrigger {
    /// Free-text scenario label, mapped heuristically to an event
    Label(String),
    Event(SimulationEvent),
}

impl From<&str> for EventTrigger {
    fn from(label: &str) -> Self {
        EventTrigger::Label(label.to_string())
    }
}

impl From<String> for EventTrigger {
    fn from(label: String) -> Self {
        EventTrigger::Label(label)
    }
}

impl From<SimulationEvent> for EventTrigger {
    fn from(event: SimulationEvent) -> Self {
        EventTrigger::Event(event)
    }
}

/// What a single `advance_time` call did
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TickReport {
    pub events_applied: usize,
    /// Hotspot escalated this tick, if any
    pub escalated: Option<String>,
    /// Hotspots returned to Normal this tick
    pub resolved: Vec<String>,
}
