use crate::agent::alarm::Alarm;
use crate::agent::status::{AgentStatus, CycleError, CycleTimings};
use crate::city::{
    camera_feed_url_at, CityFixture, CitySimulation, CityState, Hotspot, Scenario,
    SimulationEvent, TickReport,
};
use crate::oracle::{DecisionOracle, DecisionPacket};
use crate::recorder::{LogEntry, LogKind, LogRecorder};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

/// Everything the presentation layer renders in one read
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub city_id: String,
    pub city_name: String,
    pub state: CityState,
    pub status: AgentStatus,
    pub cycle_count: u64,
    pub running: bool,
    pub cycle_scheduled: bool,
    pub selected_hotspot: Option<String>,
    pub broken_links: Vec<String>,
    pub latest_packet: Option<DecisionPacket>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub status: AgentStatus,
    pub cycle_count: u64,
    pub running: bool,
    pub cycle_scheduled: bool,
}

/// Camera feed for the selected hotspot
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraView {
    pub hotspot_id: Option<String>,
    pub signal_lost: bool,
    pub url: Option<String>,
}

/// Result of a completed cycle
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub cycle: u64,
    /// Cycle number the oracle stamped on its packet
    pub packet_cycle: u64,
    pub tool_results: Vec<String>,
    pub tick: TickReport,
}

/// Mutable state of one monitoring session, guarded by a single lock
struct Session {
    city_id: String,
    city_name: String,
    world: CitySimulation,
    /// Snapshot shown to the presentation layer, refreshed at cycle boundaries
    rendered: CityState,
    status: AgentStatus,
    cycle_count: u64,
    running: bool,
    packets: Vec<DecisionPacket>,
    log: LogRecorder,
    selected_hotspot: Option<String>,
    /// Manually severed camera links; presentation only
    broken_links: BTreeSet<String>,
    /// Bumped on every city switch so late oracle replies can be dropped
    epoch: u64,
    alarm: Alarm,
}

struct Inner {
    session: Mutex<Session>,
    oracle: Arc<dyn DecisionOracle>,
    timings: CycleTimings,
}

/// Drives the Sense → Model → Act → Evaluate loop against a city simulation.
///
/// Cheap to clone; clones share the same session. Only one cycle can be in
/// flight at a time, and the session lock is never held across the oracle
/// call so reads and intents stay responsive while the oracle thinks.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Create an orchestrator monitoring `city_id`, loaded into `world`
    pub fn new(
        mut world: CitySimulation,
        city_id: &str,
        oracle: Arc<dyn DecisionOracle>,
        timings: CycleTimings,
    ) -> Self {
        let fixture = world.load_scenario(city_id);
        let rendered = world.get_state();

        let session = Session {
            city_id: fixture.id.to_string(),
            city_name: fixture.name.to_string(),
            world,
            rendered,
            status: AgentStatus::Idle,
            cycle_count: 0,
            running: false,
            packets: Vec::new(),
            log: LogRecorder::new(),
            selected_hotspot: None,
            broken_links: BTreeSet::new(),
            epoch: 0,
            alarm: Alarm::new(),
        };

        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(session),
                oracle,
                timings,
            }),
        }
    }

    pub fn timings(&self) -> CycleTimings {
        self.inner.timings
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub async fn dashboard(&self) -> DashboardSnapshot {
        let session = self.inner.session.lock().await;
        DashboardSnapshot {
            city_id: session.city_id.clone(),
            city_name: session.city_name.clone(),
            state: session.rendered.clone(),
            status: session.status,
            cycle_count: session.cycle_count,
            running: session.running,
            cycle_scheduled: session.alarm.is_armed(),
            selected_hotspot: session.selected_hotspot.clone(),
            broken_links: session.broken_links.iter().cloned().collect(),
            latest_packet: session.packets.last().cloned(),
        }
    }

    /// Rendered city snapshot
    pub async fn city_state(&self) -> CityState {
        self.inner.session.lock().await.rendered.clone()
    }

    pub async fn logs(&self) -> Vec<LogEntry> {
        self.inner.session.lock().await.log.entries().to_vec()
    }

    /// Live feed of log entries appended from now on
    pub async fn subscribe_logs(&self) -> broadcast::Receiver<LogEntry> {
        self.inner.session.lock().await.log.subscribe()
    }

    pub async fn packets(&self) -> Vec<DecisionPacket> {
        self.inner.session.lock().await.packets.clone()
    }

    pub async fn latest_packet(&self) -> Option<DecisionPacket> {
        self.inner.session.lock().await.packets.last().cloned()
    }

    pub async fn status(&self) -> StatusReport {
        let session = self.inner.session.lock().await;
        StatusReport {
            status: session.status,
            cycle_count: session.cycle_count,
            running: session.running,
            cycle_scheduled: session.alarm.is_armed(),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.inner.session.lock().await.running
    }

    pub async fn is_cycle_scheduled(&self) -> bool {
        self.inner.session.lock().await.alarm.is_armed()
    }

    /// Feed for the selected hotspot, or "signal lost" when there is no
    /// selection, the link is severed, or the hotspot has no camera
    pub async fn camera_view(&self) -> CameraView {
        let session = self.inner.session.lock().await;
        let Some(id) = session.selected_hotspot.clone() else {
            return CameraView {
                hotspot_id: None,
                signal_lost: true,
                url: None,
            };
        };

        let asset = session
            .rendered
            .hotspots
            .iter()
            .find(|h| h.id == id)
            .and_then(|h| h.camera_asset_id.clone());

        match asset {
            Some(asset) if !session.broken_links.contains(&id) => CameraView {
                hotspot_id: Some(id),
                signal_lost: false,
                url: Some(camera_feed_url_at(&asset, Utc::now())),
            },
            _ => CameraView {
                hotspot_id: Some(id),
                signal_lost: true,
                url: None,
            },
        }
    }

    // ------------------------------------------------------------------
    // Intents
    // ------------------------------------------------------------------

    /// Enable or disable run-control.
    ///
    /// Enabling arms the next cycle only from Idle or Waiting. Disabling
    /// cancels the pending cycle but never an in-flight oracle call.
    pub async fn set_running(&self, running: bool) {
        let mut guard = self.inner.session.lock().await;
        let session = &mut *guard;
        if session.running == running {
            return;
        }

        session.running = running;
        if running {
            info!(status = %session.status, "Run-control enabled");
            self.arm_next(session);
        } else {
            session.alarm.cancel();
            info!(status = %session.status, "Run-control disabled");
        }
    }

    /// Flip run-control and return the new value
    pub async fn toggle_run(&self) -> bool {
        let running = !self.is_running().await;
        self.set_running(running).await;
        running
    }

    /// Select a hotspot of the current city. Unknown ids leave the selection unchanged.
    pub async fn select_hotspot(&self, hotspot_id: &str) -> Option<Hotspot> {
        let mut session = self.inner.session.lock().await;
        let hotspot = session
            .rendered
            .hotspots
            .iter()
            .find(|h| h.id == hotspot_id)
            .cloned()?;

        session.selected_hotspot = Some(hotspot.id.clone());
        debug!(hotspot_id = %hotspot.id, "Hotspot selected");
        Some(hotspot)
    }

    pub async fn clear_selection(&self) {
        self.inner.session.lock().await.selected_hotspot = None;
    }

    /// Sever or restore the camera link of a hotspot. Returns true when severed.
    pub async fn toggle_signal(&self, hotspot_id: &str) -> bool {
        let mut guard = self.inner.session.lock().await;
        let session = &mut *guard;

        if session.broken_links.remove(hotspot_id) {
            session.log.append(
                LogKind::Info,
                format!("Manual override: Signal restored for asset {}", hotspot_id),
                None,
            );
            false
        } else {
            session.broken_links.insert(hotspot_id.to_string());
            session.log.append(
                LogKind::Action,
                format!("Manual override: Link severed for asset {}", hotspot_id),
                None,
            );
            true
        }
    }

    /// Forward a scenario label to the world. Returns whether an event was queued.
    pub async fn trigger_scenario(&self, label: &str) -> bool {
        let mut guard = self.inner.session.lock().await;
        let session = &mut *guard;

        let queued = session.world.trigger_external_event(label);
        session
            .log
            .append(LogKind::Info, format!("Scenario triggered: {}", label), None);
        info!(label = %label, queued = queued, "Scenario triggered");
        queued
    }

    /// Queue a fully specified event for the next tick
    pub async fn trigger_event(&self, event: SimulationEvent) {
        let mut guard = self.inner.session.lock().await;
        let session = &mut *guard;

        session.log.append(
            LogKind::Info,
            format!("External event queued: {}", event.description),
            serde_json::to_value(&event).ok(),
        );
        session.world.trigger_external_event(event);
    }

    pub async fn set_active_scenario(&self, scenario: Option<Scenario>) {
        let mut session = self.inner.session.lock().await;
        session.world.set_active_scenario(scenario);
        info!(scenario = ?scenario, "Active scenario changed");
    }

    /// Reset the whole session onto another city
    pub async fn switch_city(&self, city_id: &str) -> CityFixture {
        let mut guard = self.inner.session.lock().await;
        let session = &mut *guard;

        session.running = false;
        session.alarm.cancel();

        let fixture = session.world.load_scenario(city_id);
        session.city_id = fixture.id.to_string();
        session.city_name = fixture.name.to_string();
        session.rendered = session.world.get_state();
        session.packets = Vec::new();
        session.log.start_session();
        session.cycle_count = 0;
        session.selected_hotspot = None;
        session.broken_links.clear();
        session.status = AgentStatus::Idle;
        session.epoch += 1;

        session.log.append(
            LogKind::Info,
            format!("Context Shift: Switched monitoring to {}", fixture.name),
            None,
        );
        info!(city_id = %fixture.id, "Switched monitored city");
        fixture
    }

    // ------------------------------------------------------------------
    // Cycle
    // ------------------------------------------------------------------

    /// Run one full cycle.
    ///
    /// Fails fast with `CycleError::Busy` unless the orchestrator is Idle or
    /// Waiting. An oracle error is fatal to the run: the status returns to
    /// Idle and run-control is switched off. Effects already applied stay.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        let (cycle, epoch, snapshot, last_packet) = {
            let mut guard = self.inner.session.lock().await;
            let session = &mut *guard;

            session.status = session.status.begin_cycle()?;
            session.alarm.cancel();
            session.cycle_count += 1;
            let cycle = session.cycle_count;
            session
                .log
                .append(LogKind::Info, format!("Starting Cycle {}...", cycle), None);

            let snapshot = session.world.get_state();
            session.rendered = snapshot.clone();
            session.log.append(
                LogKind::Tool,
                "get_city_state() returned latest telemetry.",
                serde_json::to_value(&snapshot).ok(),
            );

            session.status = AgentStatus::Modeling;
            (
                cycle,
                session.epoch,
                snapshot,
                session.packets.last().cloned(),
            )
        };

        info!(cycle = cycle, "Cycle started, awaiting decision packet");
        let decision = self
            .inner
            .oracle
            .decide(cycle, &snapshot, last_packet.as_ref())
            .await;

        let mut guard = self.inner.session.lock().await;
        let session = &mut *guard;

        if session.epoch != epoch {
            warn!(cycle = cycle, "Session reset during decision request, dropping result");
            return Err(CycleError::Superseded { cycle });
        }

        match decision {
            Ok(packet) => {
                let report = self.apply_packet(session, cycle, packet);
                self.arm_next(session);
                Ok(report)
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                session
                    .log
                    .append(LogKind::Tool, format!("Cycle failed: {}", reason), None);
                session.status = AgentStatus::Idle;
                session.running = false;
                session.alarm.cancel();
                error!(cycle = cycle, error = %reason, "Cycle failed, run-control disabled");
                Err(CycleError::Oracle { cycle, reason })
            }
        }
    }

    /// Acting and evaluating stages
    fn apply_packet(&self, session: &mut Session, cycle: u64, packet: DecisionPacket) -> CycleReport {
        session.status = AgentStatus::Acting;
        session.log.append(
            LogKind::Packet,
            format!("Decision Packet Generated for Cycle {}", packet.cycle),
            None,
        );

        let mut tool_results = Vec::with_capacity(packet.tool_calls().len());
        for call in packet.tool_calls() {
            let result = session.world.execute_action(&call.tool, &call.params);
            debug!(cycle = cycle, tool = %call.tool, "Tool call applied");
            session.log.append(LogKind::Action, result.clone(), None);
            tool_results.push(result);
        }

        let packet_cycle = packet.cycle;
        session.packets.push(packet);

        session.status = AgentStatus::Evaluating;
        let tick = session.world.advance_time();
        session.rendered = session.world.get_state();

        session.log.append(
            LogKind::Info,
            format!(
                "Cycle complete. Entering holding pattern for {}s.",
                self.inner.timings.holding_delay.as_secs()
            ),
            None,
        );
        session.status = AgentStatus::Waiting;

        info!(
            cycle = cycle,
            tool_calls = tool_results.len(),
            escalated = ?tick.escalated,
            "Cycle complete"
        );

        CycleReport {
            cycle,
            packet_cycle,
            tool_results,
            tick,
        }
    }

    /// Arm the next cycle if run-control is on and the status schedules
    fn arm_next(&self, session: &mut Session) {
        if !session.running {
            return;
        }
        let Some(delay) = session.status.scheduling_delay(&self.inner.timings) else {
            return;
        };

        let orchestrator = self.clone();
        session.alarm.arm(delay, move || {
            tokio::spawn(async move {
                orchestrator.run_scheduled_cycle().await;
            });
        });

        debug!(
            status = %session.status,
            delay_ms = delay.as_millis() as u64,
            "Next cycle scheduled"
        );
    }

    async fn run_scheduled_cycle(&self) {
        match self.run_cycle().await {
            Ok(report) => debug!(cycle = report.cycle, "Scheduled cycle finished"),
            Err(CycleError::Busy(status)) => {
                debug!(status = %status, "Scheduled cycle skipped, another is in flight")
            }
            Err(e) => warn!(error = %e, "Scheduled cycle did not complete"),
        }
    }
}
