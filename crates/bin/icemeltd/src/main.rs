//! # icemeltd — ice-melt supervisor daemon
//!
//! Composition root that wires the state machine to its inputs and outputs
//! and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (CLI arg, env vars, config file)
//! - Initialize `tracing` with the configured filter
//! - Construct the [`StateMachine`], seeded into the initial state
//! - Feed sensor readings from stdin (`<sensor name> <raw value>` per line)
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no machine logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use icemelt_adapter_http_axum::router;
use icemelt_adapter_http_axum::state::AppState;
use icemelt_app::control_output::TracingControlOutput;
use icemelt_app::event_bus::InProcessEventBus;
use icemelt_app::sensor_feed::run_sensor_feed;
use icemelt_app::state_machine::StateMachine;

use crate::config::Config;

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let result = runtime.block_on(run());
    // The stdin reader sits in a blocking read that cannot be cancelled.
    runtime.shutdown_background();
    result
}

async fn run() -> anyhow::Result<()> {
    let path = Config::path_from_env();
    let config = Config::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|err| {
            eprintln!("invalid log filter {:?}: {err}", config.logging.filter);
            EnvFilter::new("info")
        }))
        .init();

    let machine_config = config
        .machine_config()
        .context("invalid machine configuration")?;
    for warning in machine_config.warnings() {
        tracing::warn!(%warning, "configuration warning");
    }
    for pid in machine_config.process_controllers() {
        tracing::info!(
            name = %pid.name,
            sensor = %pid.sensor,
            proportional_gain = pid.proportional_gain,
            integral_gain = pid.integral_gain,
            derivative_gain = pid.derivative_gain,
            proportional_on_measurement = pid.proportional_on_measurement,
            rate_hz = pid.rate_hz,
            "process controller declared but not run"
        );
    }

    // Machine
    let event_bus = Arc::new(InProcessEventBus::new(256));
    let machine = StateMachine::new(machine_config, TracingControlOutput, Arc::clone(&event_bus))?;

    // Sensor feed
    let feed = tokio::spawn(run_sensor_feed(
        BufReader::new(tokio::io::stdin()),
        machine.clone(),
    ));

    // HTTP
    let app = router::build(
        AppState::new(machine, event_bus),
        config.server.assets_dir.as_deref(),
    );
    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(%bind_addr, "icemeltd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    feed.abort();
    tracing::info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!(signal = "SIGINT", "shutting down"),
        () = terminate => tracing::info!(signal = "SIGTERM", "shutting down"),
    }
}
