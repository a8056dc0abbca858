//! CivicOS Oracle Relay - decision endpoint backed by a generative model.
//!
//! The orchestrator posts the current city state to `POST /api/cycle`; the
//! relay turns it into a prompt, asks Gemini for a JSON reply constrained by
//! the decision packet schema, and returns the validated packet.
//!
//! ```text
//! Orchestrator ──POST /api/cycle──▶ Relay ──generateContent──▶ Gemini
//!      ◀──────── DecisionPacket ────────┘
//! ```

pub mod api;
pub mod gemini;
pub mod prompt;

pub use gemini::GeminiClient;
