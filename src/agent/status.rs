use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Orchestrator state machine.
///
/// A cycle runs Sensing → Modeling → Acting → Evaluating → Waiting.
/// `Planning` is declared for status reporting but no transition enters it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    Idle,
    Sensing,
    Modeling,
    Planning,
    Acting,
    Evaluating,
    Waiting,
}

/// Delays the orchestrator uses to re-arm itself
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CycleTimings {
    /// Wait before the first cycle after entering Idle
    pub startup_delay: Duration,
    /// Holding period after a completed cycle
    pub holding_delay: Duration,
}

impl Default for CycleTimings {
    fn default() -> Self {
        Self {
            startup_delay: Duration::from_secs(1),
            holding_delay: Duration::from_secs(30),
        }
    }
}

/// Errors surfaced by `Orchestrator::run_cycle`
#[derive(Debug, Clone, PartialEq)]
pub enum CycleError {
    /// A cycle is already in flight
    Busy(AgentStatus),
    /// The session was reset while the oracle call was in flight
    Superseded { cycle: u64 },
    /// The oracle failed; run-control has been switched off
    Oracle { cycle: u64, reason: String },
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CycleError::Busy(status) => {
                write!(f, "cycle already in progress (status {})", status)
            }
            CycleError::Superseded { cycle } => {
                write!(f, "cycle {} superseded by a session reset", cycle)
            }
            CycleError::Oracle { cycle, reason } => {
                write!(f, "cycle {} failed: {}", cycle, reason)
            }
        }
    }
}

impl std::error::Error for CycleError {}

impl AgentStatus {
    /// True when a new cycle may start
    pub fn accepts_cycle_start(self) -> bool {
        matches!(self, AgentStatus::Idle | AgentStatus::Waiting)
    }

    /// Guarded transition into a new cycle
    pub fn begin_cycle(self) -> Result<AgentStatus, CycleError> {
        if self.accepts_cycle_start() {
            Ok(AgentStatus::Sensing)
        } else {
            Err(CycleError::Busy(self))
        }
    }

    /// How long to wait before self-scheduling from this status.
    ///
    /// Intermediate statuses never schedule.
    pub fn scheduling_delay(self, timings: &CycleTimings) -> Option<Duration> {
        match self {
            AgentStatus::Idle => Some(timings.startup_delay),
            AgentStatus::Waiting => Some(timings.holding_delay),
            _ => None,
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AgentStatus::Idle => "IDLE",
            AgentStatus::Sensing => "SENSING",
            AgentStatus::Modeling => "MODELING",
            AgentStatus::Planning => "PLANNING",
            AgentStatus::Acting => "ACTING",
            AgentStatus::Evaluating => "EVALUATING",
            AgentStatus::Waiting => "WAITING",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [AgentStatus; 7] = [
        AgentStatus::Idle,
        AgentStatus::Sensing,
        AgentStatus::Modeling,
        AgentStatus::Planning,
        AgentStatus::Acting,
        AgentStatus::Evaluating,
        AgentStatus::Waiting,
    ];

    #[test]
    fn test_only_idle_and_waiting_begin_cycles() {
        for status in ALL {
            let result = status.begin_cycle();
            match status {
                AgentStatus::Idle | AgentStatus::Waiting => {
                    assert_eq!(result, Ok(AgentStatus::Sensing))
                }
                other => assert_eq!(result, Err(CycleError::Busy(other))),
            }
        }
    }

    #[test]
    fn test_scheduling_delays() {
        let timings = CycleTimings::default();

        assert_eq!(
            AgentStatus::Idle.scheduling_delay(&timings),
            Some(Duration::from_secs(1))
        );
        assert_eq!(
            AgentStatus::Waiting.scheduling_delay(&timings),
            Some(Duration::from_secs(30))
        );
        for status in &ALL[1..6] {
            assert_eq!(status.scheduling_delay(&timings), None);
        }
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_value(AgentStatus::Evaluating).unwrap(),
            "EVALUATING"
        );
        assert_eq!(AgentStatus::Modeling.to_string(), "MODELING");
    }
}
