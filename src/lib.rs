// World model and presets
pub mod city;

// Decision oracle client and packet model
pub mod oracle;

// Cycle orchestrator
pub mod agent;

// Session audit log
pub mod recorder;

// HTTP and WebSocket APIs
pub mod api;

// Configuration
pub mod config;
