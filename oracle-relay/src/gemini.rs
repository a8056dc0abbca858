use crate::prompt::{decision_packet_schema, SYSTEM_PROMPT};
use anyhow::{anyhow, bail, Context, Result};
use civicos::oracle::DecisionPacket;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub const BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// HTTP client for the Gemini `generateContent` API.
///
/// Every request carries the CivicOS system instruction and asks for JSON
/// constrained by the decision packet schema.
pub struct GeminiClient {
    api_key: String,
    model: String,
    http_client: Client,
    base_url: String,
}

impl GeminiClient {
    /// Create a client using the public Gemini endpoint.
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, BASE_URL.to_string())
    }

    /// Create a client with a custom base URL (for testing with a mock server).
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the model for a decision packet answering `prompt`.
    pub async fn generate_packet(&self, prompt: &str) -> Result<DecisionPacket> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "systemInstruction": { "parts": [{ "text": SYSTEM_PROMPT }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": decision_packet_schema(),
            },
        });

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send generateContent request")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error: {} {}", status, detail.trim()));
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to parse generateContent response")?;

        let Some(text) = reply.text() else {
            bail!("Empty response from AI");
        };
        debug!(model = %self.model, bytes = text.len(), "Model reply received");

        serde_json::from_str(&text).context("Model reply is not a valid decision packet")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    const PATH: &str = "/v1beta/models/gemini-2.0-flash-exp:generateContent";

    fn reply_with_text(text: &str) -> String {
        json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        })
        .to_string()
    }

    fn client(server: &Server) -> GeminiClient {
        GeminiClient::with_base_url(
            "test_key".to_string(),
            DEFAULT_MODEL.to_string(),
            server.url(),
        )
    }

    #[tokio::test]
    async fn test_generate_packet() {
        let packet = json!({
            "cycle": 3,
            "time": "2024-01-01T00:00:00Z",
            "situationSummary": ["Congestion rising on the bridge"],
            "causalHypotheses": ["Lane closure"],
            "forecast": "Worsening",
            "actionsChosen": [],
            "metricsToWatch": ["congestionIndex"],
            "learningNotes": "None",
            "toolCalls": [{ "tool": "adjust_signals", "params": { "target": "bb1" } }]
        });

        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .match_header("x-goog-api-key", "test_key")
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": { "responseMimeType": "application/json" }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply_with_text(&packet.to_string()))
            .create_async()
            .await;

        let result = client(&server).generate_packet("CURRENT CYCLE: 3").await.unwrap();

        assert_eq!(result.cycle, 3);
        assert_eq!(result.forecast, "Worsening");
        assert_eq!(result.tool_calls()[0].tool, "adjust_signals");
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": []}"#)
            .create_async()
            .await;

        let err = client(&server).generate_packet("prompt").await.unwrap_err();
        assert_eq!(err.to_string(), "Empty response from AI");
    }

    #[tokio::test]
    async fn test_reply_missing_required_fields_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(reply_with_text(r#"{"cycle": 1}"#))
            .create_async()
            .await;

        let err = client(&server).generate_packet("prompt").await.unwrap_err();
        assert!(err.to_string().contains("not a valid decision packet"));
    }

    #[tokio::test]
    async fn test_api_error_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", PATH)
            .with_status(403)
            .with_body("API key not valid")
            .create_async()
            .await;

        let err = client(&server).generate_packet("prompt").await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("403"));
        assert!(message.contains("API key not valid"));
    }
}
