use serde_json::{json, Value};

/// System instruction sent with every cycle
pub const SYSTEM_PROMPT: &str = "\
You are the AI core of \"CivicOS\", an autonomous city-operations agent.
Your goal is to analyze city metrics, identify issues, and execute interventions.
Maintain a cool, logical, and efficient persona.

GOALS:
1. Preserve life and safety
2. Maintain essential services
3. Reduce congestion
4. Communicate clearly
5. Minimize economic disruption

OPERATIONAL TOOLS:
- adjust_signals(params): Retimes traffic signals to ease congestion.
- dispatch_ems(params): Sends emergency medical services to a target.
- broadcast_alert(params): Publishes a public alert with a message.

Output a JSON object with: cycle, time, situationSummary, causalHypotheses, \
forecast, actionsChosen, publicUpdate, metricsToWatch, learningNotes, toolCalls.
";

/// User prompt for one decision cycle
pub fn build_cycle_prompt(cycle: u64, city_state: &Value, last_packet: Option<&Value>) -> String {
    let last = match last_packet {
        Some(packet) if !packet.is_null() => packet.to_string(),
        _ => Value::from("N/A").to_string(),
    };

    format!(
        "CURRENT CYCLE: {}\n\
         CITY STATE: {}\n\
         LAST DECISION PACKET: {}\n\
         \n\
         Perform your cycle steps (Sense, Model, Plan, Act, Evaluate).\n\
         Identify risk hotspots and generate a decision packet.",
        cycle, city_state, last
    )
}

/// Response schema constraining the model reply to a decision packet
pub fn decision_packet_schema() -> Value {
    let strings = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

    json!({
        "type": "OBJECT",
        "properties": {
            "cycle": { "type": "INTEGER" },
            "time": { "type": "STRING" },
            "situationSummary": strings,
            "causalHypotheses": strings,
            "forecast": { "type": "STRING" },
            "actionsChosen": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "actionName": { "type": "STRING" },
                        "target": { "type": "STRING" },
                        "why": { "type": "STRING" },
                        "rollback": { "type": "STRING" }
                    },
                    "required": ["actionName", "target", "why", "rollback"]
                }
            },
            "publicUpdate": { "type": "STRING" },
            "metricsToWatch": strings,
            "learningNotes": { "type": "STRING" },
            "toolCalls": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "tool": { "type": "STRING" },
                        "params": {
                            "type": "OBJECT",
                            "description": "Tool parameters used for the intervention",
                            "properties": {
                                "id": { "type": "STRING", "description": "Identifier for target asset or area" },
                                "target": { "type": "STRING", "description": "Subject of the action" },
                                "value": { "type": "NUMBER", "description": "Numerical value if applicable (e.g., intensity, duration)" },
                                "message": { "type": "STRING", "description": "Descriptive message or broadcast content" }
                            }
                        }
                    },
                    "required": ["tool", "params"]
                }
            }
        },
        "required": [
            "cycle", "time", "situationSummary", "causalHypotheses", "forecast",
            "actionsChosen", "metricsToWatch", "learningNotes"
        ]
    })
}
