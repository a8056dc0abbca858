// Cycle orchestrator: status machine, re-arming timer and the decision loop

mod alarm;
mod orchestrator;
mod status;

pub use alarm::Alarm;
pub use orchestrator::{CameraView, CycleReport, DashboardSnapshot, Orchestrator, StatusReport};
pub use status::{AgentStatus, CycleError, CycleTimings};
