// Decision oracle: packet model and the HTTP client with fallback

mod client;
mod packet;

pub use client::{DecisionOracle, OracleClient};
pub use packet::{ActionEntry, DecisionPacket, ToolCall};
