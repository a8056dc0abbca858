use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Structured output of one decision cycle
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionPacket {
    /// Orchestrator cycle number at request time
    pub cycle: u64,
    pub time: String,
    pub situation_summary: Vec<String>,
    pub causal_hypotheses: Vec<String>,
    pub forecast: String,
    pub actions_chosen: Vec<ActionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_update: Option<String>,
    pub metrics_to_watch: Vec<String>,
    pub learning_notes: String,
    /// None means no interventions were proposed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEntry {
    pub action_name: String,
    pub target: String,
    pub why: String,
    pub rollback: String,
}

/// Named intervention to replay against the world model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl DecisionPacket {
    /// Packet returned when the oracle cannot be reached or answers garbage
    pub fn fallback(cycle: u64) -> Self {
        Self {
            cycle,
            time: Utc::now().to_rfc3339(),
            situation_summary: vec![
                "Agent system offline or unresponsive.".to_string(),
                "Manual control recommended.".to_string(),
            ],
            causal_hypotheses: vec![
                "Backend Connectivity Issue".to_string(),
                "Model Overload".to_string(),
            ],
            forecast: "Uncertain".to_string(),
            actions_chosen: Vec::new(),
            public_update: None,
            metrics_to_watch: Vec::new(),
            learning_notes: "System error logged.".to_string(),
            tool_calls: Some(Vec::new()),
        }
    }

    /// Tool calls in proposal order (empty when none were proposed)
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}
