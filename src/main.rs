use anyhow::{anyhow, Context, Result};
use civicos::agent::Orchestrator;
use civicos::api::create_router;
use civicos::city::CitySimulation;
use civicos::config::{env::config_path, load_or_default};
use civicos::oracle::{DecisionOracle, OracleClient};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "civicos=info".into()),
        )
        .init();

    info!("CivicOS starting...");

    let path = config_path();
    let mut config = load_or_default(&path)
        .map_err(|e| anyhow!("{}", e))
        .with_context(|| format!("Failed to load config from {}", path))?;
    config.apply_env();

    info!(
        config_path = %path,
        port = config.server.port,
        oracle_endpoint = %config.oracle.endpoint,
        default_city = %config.simulation.default_city,
        autostart = config.cycle.autostart,
        "Configuration loaded"
    );

    // World model
    let mut world = CitySimulation::default();
    if let Some(seed) = config.simulation.seed {
        world = world.with_seed(seed);
        info!(seed = seed, "Simulation seeded");
    }

    // Decision oracle
    let oracle: Arc<dyn DecisionOracle> = match config.oracle.request_timeout() {
        Some(timeout) => Arc::new(
            OracleClient::with_timeout(config.oracle.endpoint.clone(), timeout)
                .context("Failed to build oracle client")?,
        ),
        None => Arc::new(OracleClient::new(config.oracle.endpoint.clone())),
    };

    let orchestrator = Orchestrator::new(
        world,
        &config.simulation.default_city,
        oracle,
        config.cycle.timings(),
    );
    if config.cycle.autostart {
        orchestrator.set_running(true).await;
    }

    // HTTP API
    let router = create_router(orchestrator.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.server.port))
        .await
        .context("Failed to bind API port")?;
    info!(port = config.server.port, "Dashboard API listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "API server error");
        }
    });

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl_c signal")?;
    info!("Shutdown signal received");

    orchestrator.set_running(false).await;
    server_handle.abort();
    info!("CivicOS stopped");

    Ok(())
}
