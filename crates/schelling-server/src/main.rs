//! HTTP control surface for the segregation engine: serves board state, forwards
//! step and move commands, and owns the play/pause timer.

mod api;
mod playback;
mod telemetry;

use anyhow::Result;
use schelling_core::ServerConfig;
use schelling_world::Simulation;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize telemetry
    telemetry::init_telemetry(config.json_logs)?;

    info!(
        "Starting Schelling server on {}:{}",
        config.bind_address, config.port
    );

    let simulation_config = config.load_simulation_config()?;
    let simulation = Simulation::new(simulation_config)?;
    let state = api::AppState::new(simulation, config.playback.clone());

    // Start playback timer
    tokio::spawn(playback::run_playback_loop(state.clone()));

    let app = api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
