use crate::city::fixtures::{fixture_or_default, CityFixture, DEFAULT_CITY_ID};
use crate::city::model::{
    CityState, EventKind, EventTrigger, HotspotStatus, Scenario, SimulationEvent, TickReport,
};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use std::collections::{HashSet, VecDeque};
use tracing::{debug, info};

/// Width of one camera feed refresh window
const CAMERA_BUCKET_MILLIS: i64 = 5_000;

/// Chance that a tick escalates one hotspot
const ESCALATION_PROBABILITY: f64 = 0.15;

/// Per-hotspot chance of resolving on a tick without escalation
const RESOLUTION_PROBABILITY: f64 = 0.4;

/// World model for one city.
///
/// Owns weather, metrics, hotspots and the pending event queue. None of the
/// operations fail: unknown ids and malformed input degrade to no-ops or
/// generic success.
pub struct CitySimulation {
    state: CityState,
    /// Applied action ids. Tracked only, never read back.
    interventions: HashSet<String>,
    event_queue: VecDeque<SimulationEvent>,
    active_scenario: Option<Scenario>,
    rng: StdRng,
}

impl CitySimulation {
    /// Create a simulation from an initial state
    pub fn new(initial: CityState) -> Self {
        Self {
            state: initial,
            interventions: HashSet::new(),
            event_queue: VecDeque::new(),
            active_scenario: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a simulation from a named preset (unknown ids use the default city)
    pub fn from_fixture(city_id: &str) -> Self {
        Self::new(fixture_or_default(city_id).state)
    }

    /// Replace the random source with a seeded one for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Owned copy of the current state
    pub fn get_state(&self) -> CityState {
        self.state.clone()
    }

    pub fn active_scenario(&self) -> Option<Scenario> {
        self.active_scenario
    }

    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }

    pub fn interventions(&self) -> usize {
        self.interventions.len()
    }

    /// Replace the state wholesale from a preset.
    ///
    /// Unknown ids silently fall back to the default city. Clears the
    /// intervention set, the event queue and the active scenario.
    pub fn load_scenario(&mut self, city_id: &str) -> CityFixture {
        let fixture = fixture_or_default(city_id);
        if fixture.id != city_id {
            debug!(
                requested = %city_id,
                fallback = DEFAULT_CITY_ID,
                "Unknown city, using default fixture"
            );
        }

        self.state = fixture.state.clone();
        self.interventions.clear();
        self.event_queue.clear();
        self.active_scenario = None;

        info!(city_id = %fixture.id, "City loaded");
        fixture
    }

    /// Camera URL for the current 5-second window
    pub fn get_camera_feed_url(&self, asset_id: &str) -> String {
        camera_feed_url_at(asset_id, Utc::now())
    }

    /// Apply a named intervention and describe what happened.
    ///
    /// Unknown action ids succeed generically and echo their params.
    pub fn execute_action(&mut self, action_id: &str, params: &Map<String, Value>) -> String {
        self.interventions.insert(action_id.to_string());
        let param = |key: &str| params.get(key).and_then(Value::as_str);

        match action_id {
            "dispatch_ems" => {
                let metrics = &mut self.state.metrics;
                metrics.ems_load = (metrics.ems_load - 15.0).max(0.0);
                metrics.safety_incidents = metrics.safety_incidents.saturating_sub(1);
                format!(
                    "Units dispatched to {}. EMS load reduced.",
                    param("target").unwrap_or("target sector")
                )
            }
            "adjust_signals" => {
                let metrics = &mut self.state.metrics;
                metrics.congestion_index = (metrics.congestion_index - 10.0).max(0.0);
                format!(
                    "Signal timing adjusted for {}. Flow improved.",
                    param("target").unwrap_or("grid")
                )
            }
            "broadcast_alert" => format!(
                "Public alert broadcast: \"{}\".",
                param("message").unwrap_or("Caution advised")
            ),
            other => format!(
                "Executed {} with {}. Status: Success.",
                other,
                Value::Object(params.clone())
            ),
        }
    }

    /// Advance the world by one tick
    pub fn advance_time(&mut self) -> TickReport {
        let mut report = TickReport::default();

        // 1. Base fluctuation
        let congestion = self.rng.gen_range(-3.0..=3.0);
        let ems = self.rng.gen_range(-2.0..=2.0);
        let transit = self.rng.gen_range(-1.0..=1.0);
        let grid = self.rng.gen_range(-1.5..=1.5);
        let metrics = &mut self.state.metrics;
        metrics.congestion_index = clamp_percent(metrics.congestion_index + congestion);
        metrics.ems_load = clamp_percent(metrics.ems_load + ems);
        metrics.transit_on_time = clamp_percent(metrics.transit_on_time + transit);
        metrics.power_grid_load = clamp_percent(metrics.power_grid_load + grid);

        // 2. Scenario bias
        if self.active_scenario == Some(Scenario::Storm) {
            metrics.congestion_index = clamp_percent(metrics.congestion_index + 2.0);
            metrics.power_grid_load = clamp_percent(metrics.power_grid_load + 1.5);
        }

        // 3. Queued events, FIFO
        while let Some(event) = self.event_queue.pop_front() {
            self.apply_event(&event);
            report.events_applied += 1;
        }

        // 4. Random incidents, or resolution when none
        if !self.state.hotspots.is_empty() && self.rng.gen_bool(ESCALATION_PROBABILITY) {
            report.escalated = Some(self.escalate_random_hotspot());
        } else {
            report.resolved = self.resolve_hotspots();
        }

        self.state.timestamp = Utc::now();
        report
    }

    /// Queue a perturbation for the next tick.
    ///
    /// Labels are matched heuristically; only rain is recognized. Returns
    /// whether anything was queued.
    pub fn trigger_external_event(&mut self, trigger: impl Into<EventTrigger>) -> bool {
        match trigger.into() {
            EventTrigger::Label(label) => {
                if label.contains("Rain") {
                    self.event_queue.push_back(SimulationEvent {
                        kind: EventKind::Weather,
                        severity: 80.0,
                        description: "Heavy Rain detected".to_string(),
                        location: None,
                    });
                    true
                } else {
                    debug!(label = %label, "Unrecognized scenario label ignored");
                    false
                }
            }
            EventTrigger::Event(event) => {
                self.event_queue.push_back(event);
                true
            }
        }
    }

    /// Set or clear the persistent scenario bias
    pub fn set_active_scenario(&mut self, scenario: Option<Scenario>) {
        self.active_scenario = scenario;
    }

    fn apply_event(&mut self, event: &SimulationEvent) {
        match event.kind {
            EventKind::Weather => {
                self.state.weather.condition = event.description.clone();
                let metrics = &mut self.state.metrics;
                metrics.congestion_index =
                    clamp_percent(metrics.congestion_index + event.severity / 10.0);
            }
            EventKind::Incident | EventKind::SystemFailure => {
                debug!(kind = ?event.kind, "Event type has no world effect");
            }
        }
    }

    fn escalate_random_hotspot(&mut self) -> String {
        let index = self.rng.gen_range(0..self.state.hotspots.len());
        let status = if self.rng.gen_bool(0.5) {
            HotspotStatus::Warning
        } else {
            HotspotStatus::Critical
        };

        let hotspot = &mut self.state.hotspots[index];
        hotspot.status = status;
        hotspot.reason = "Unexpected surge in activity reported.".to_string();
        let id = hotspot.id.clone();

        let metrics = &mut self.state.metrics;
        metrics.congestion_index = clamp_percent(metrics.congestion_index + 5.0);
        metrics.safety_incidents = metrics.safety_incidents.saturating_add(1);

        debug!(hotspot_id = %id, status = ?status, "Hotspot escalated");
        id
    }

    fn resolve_hotspots(&mut self) -> Vec<String> {
        let mut resolved = Vec::new();
        for hotspot in &mut self.state.hotspots {
            if hotspot.status != HotspotStatus::Normal && self.rng.gen_bool(RESOLUTION_PROBABILITY)
            {
                hotspot.status = HotspotStatus::Normal;
                hotspot.reason = "Situation normalized".to_string();
                resolved.push(hotspot.id.clone());
            }
        }
        resolved
    }
}

impl Default for CitySimulation {
    fn default() -> Self {
        Self::from_fixture(DEFAULT_CITY_ID)
    }
}

/// Camera URL for the 5-second window containing `now`
pub fn camera_feed_url_at(asset_id: &str, now: DateTime<Utc>) -> String {
    let bucket = now.timestamp_millis().div_euclid(CAMERA_BUCKET_MILLIS);
    format!(
        "https://picsum.photos/seed/{}_{}/800/600?grayscale",
        asset_id, bucket
    )
}

fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
