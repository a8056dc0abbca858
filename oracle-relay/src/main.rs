use anyhow::{Context, Result};
use oracle_relay::api::{create_router, RelayState};
use oracle_relay::gemini::{GeminiClient, BASE_URL, DEFAULT_MODEL};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oracle_relay=info".into()),
        )
        .init();

    info!("Oracle relay starting...");

    // Read configuration from environment
    let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
    if api_key.is_empty() || api_key == "PLACEHOLDER_API_KEY" {
        error!("GEMINI_API_KEY is not set; decision cycles will fail until it is");
    }

    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let api_url = std::env::var("GEMINI_API_URL").unwrap_or_else(|_| BASE_URL.to_string());

    let port: u16 = std::env::var("ORACLE_RELAY_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse()
        .context("ORACLE_RELAY_PORT must be a valid port number")?;

    info!(model = %model, api_url = %api_url, port = port, "Configuration loaded");

    let state = RelayState {
        gemini: Arc::new(GeminiClient::with_base_url(api_key, model, api_url)),
    };
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .context("Failed to bind relay port")?;
    info!(port = port, "Oracle relay listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "Relay server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    info!("Oracle relay stopped");

    Ok(())
}
