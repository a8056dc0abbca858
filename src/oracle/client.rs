use crate::city::CityState;
use crate::oracle::packet::DecisionPacket;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

/// Source of decision packets for the cycle orchestrator.
///
/// Implementations may fail; the orchestrator treats an `Err` as fatal to
/// the current run.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn decide(
        &self,
        cycle: u64,
        city_state: &CityState,
        last_packet: Option<&DecisionPacket>,
    ) -> Result<DecisionPacket>;
}

/// Request body sent to the oracle boundary
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CycleRequest<'a> {
    cycle_number: u64,
    city_state: &'a CityState,
    /// Serialized as null when there is no prior packet
    last_packet: Option<&'a DecisionPacket>,
}

/// HTTP client for the decision oracle.
///
/// Never surfaces errors: transport failures, non-success statuses and
/// unparseable replies all produce the fallback packet.
pub struct OracleClient {
    http_client: Client,
    endpoint: String,
}

impl OracleClient {
    /// Create a client without a request timeout
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build oracle HTTP client")?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Ask the oracle for a decision, substituting the fallback on any failure
    pub async fn request_decision(
        &self,
        cycle: u64,
        city_state: &CityState,
        last_packet: Option<&DecisionPacket>,
    ) -> DecisionPacket {
        match self.try_request(cycle, city_state, last_packet).await {
            Ok(packet) => packet,
            Err(e) => {
                error!(cycle = cycle, error = %e, "Agent decision cycle failed, using fallback packet");
                DecisionPacket::fallback(cycle)
            }
        }
    }

    async fn try_request(
        &self,
        cycle: u64,
        city_state: &CityState,
        last_packet: Option<&DecisionPacket>,
    ) -> Result<DecisionPacket> {
        let body = CycleRequest {
            cycle_number: cycle,
            city_state,
            last_packet,
        };

        debug!(cycle = cycle, endpoint = %self.endpoint, "Requesting decision packet");

        let response = self
            .http_client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to send decision request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            anyhow::bail!("Oracle returned error status {}: {}", status, body);
        }

        let text = response
            .text()
            .await
            .context("Failed to read decision response")?;

        if text.trim().is_empty() {
            anyhow::bail!("Empty response from oracle");
        }

        serde_json::from_str(&text).context("Failed to parse decision packet")
    }
}

#[async_trait]
impl DecisionOracle for OracleClient {
    async fn decide(
        &self,
        cycle: u64,
        city_state: &CityState,
        last_packet: Option<&DecisionPacket>,
    ) -> Result<DecisionPacket> {
        Ok(self.request_decision(cycle, city_state, last_packet).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::fixture_or_default;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn city() -> CityState {
        fixture_or_default("nyc").state
    }

    fn packet_json(cycle: u64) -> serde_json::Value {
        json!({
            "cycle": cycle,
            "time": "2024-01-01T00:00:00Z",
            "situationSummary": ["Congestion rising on the Brooklyn Bridge"],
            "causalHypotheses": ["Lane closure"],
            "forecast": "Peak in 20 minutes",
            "actionsChosen": [{
                "actionName": "adjust_signals",
                "target": "Brooklyn Bridge",
                "why": "Clear approach queues",
                "rollback": "Restore default plan"
            }],
            "publicUpdate": "Expect delays near the bridge",
            "metricsToWatch": ["congestionIndex"],
            "learningNotes": "Signal plans respond within one cycle",
            "toolCalls": [{"tool": "adjust_signals", "params": {"target": "Brooklyn Bridge"}}]
        })
    }

    fn assert_fallback(packet: &DecisionPacket, cycle: u64) {
        assert_eq!(packet.cycle, cycle);
        assert!(packet.actions_chosen.is_empty());
        assert_eq!(packet.forecast, "Uncertain");
        assert!(packet.tool_calls().is_empty());
    }

    #[tokio::test]
    async fn test_request_decision_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/cycle")
            .match_body(Matcher::PartialJson(json!({
                "cycleNumber": 3,
                "lastPacket": null,
                "cityState": {"metrics": {"congestionIndex": 58.0}}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(packet_json(3).to_string())
            .create_async()
            .await;

        let client = OracleClient::new(format!("{}/api/cycle", server.url()));
        let packet = client.request_decision(3, &city(), None).await;

        assert_eq!(packet.cycle, 3);
        assert_eq!(packet.actions_chosen[0].action_name, "adjust_signals");
        assert_eq!(packet.tool_calls()[0].params["target"], "Brooklyn Bridge");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_request_includes_last_packet() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/cycle")
            .match_body(Matcher::PartialJson(json!({
                "cycleNumber": 2,
                "lastPacket": {"cycle": 1, "forecast": "Uncertain"}
            })))
            .with_status(200)
            .with_body(packet_json(2).to_string())
            .create_async()
            .await;

        let client = OracleClient::new(format!("{}/api/cycle", server.url()));
        let previous = DecisionPacket::fallback(1);
        let packet = client.request_decision(2, &city(), Some(&previous)).await;

        assert_eq!(packet.cycle, 2);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_yields_fallback() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/cycle")
            .with_status(500)
            .with_body(r#"{"error":"Internal Server Error","details":"Empty response from AI"}"#)
            .create_async()
            .await;

        let client = OracleClient::new(format!("{}/api/cycle", server.url()));
        let packet = client.request_decision(9, &city(), None).await;

        assert_fallback(&packet, 9);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_malformed_body_yields_fallback() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/cycle")
            .with_status(200)
            .with_body(r#"{"cycle": 4, "time": "now"}"#)
            .create_async()
            .await;

        let client = OracleClient::new(format!("{}/api/cycle", server.url()));
        let packet = client.request_decision(4, &city(), None).await;

        assert_fallback(&packet, 4);
    }

    #[tokio::test]
    async fn test_empty_body_yields_fallback() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/cycle")
            .with_status(200)
            .with_body("  ")
            .create_async()
            .await;

        let client = OracleClient::new(format!("{}/api/cycle", server.url()));
        let packet = client.request_decision(5, &city(), None).await;

        assert_fallback(&packet, 5);
    }

    #[tokio::test]
    async fn test_unreachable_oracle_yields_fallback() {
        let client = OracleClient::new("http://127.0.0.1:9/api/cycle");
        let packet = client.request_decision(6, &city(), None).await;

        assert_fallback(&packet, 6);
    }

    #[tokio::test]
    async fn test_decide_never_errors() {
        let client = OracleClient::new("http://127.0.0.1:9/api/cycle");
        let result = client.decide(1, &city(), None).await;

        assert!(result.is_ok());
    }
}
