//! Host binary for the Aether environment simulation.
//!
//! Loads configuration, initializes logging, assembles the simulation, and
//! drives the step loop until a bound is reached or Ctrl-C is pressed.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `aether-config.yaml` (or the path given as
//!    the first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Assemble clock, weather engine, and aggregator
//! 4. Attach log sinks to the event streams
//! 5. Install the Ctrl-C stop handler
//! 6. Run the step loop
//! 7. Log the result and the final status

mod error;
mod log_sinks;
mod status_callback;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use aether_core::config::LoggingConfig;
use aether_core::{RunControl, Simulation, SimulationConfig, runner};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::status_callback::StatusCallback;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "aether-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, assembly, or the run fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let loaded = load_config(&config_path)?;
    let found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("aether-engine starting");
    if found {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }

    // 3. Assemble the simulation.
    let mut simulation = Simulation::new(&config).map_err(EngineError::from)?;
    info!(
        time = %simulation.formatted_time(),
        period = %simulation.current_period(),
        mode = ?simulation.clock().mode(),
        weather = %simulation.weather().current().kind,
        "Simulation assembled"
    );

    // 4. Log event streams.
    log_sinks::attach(&mut simulation);

    // 5. Stop cleanly on Ctrl-C.
    let control = Arc::new(RunControl::new(&config.simulation));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping");
                    control.request_stop();
                }
                Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
            }
        });
    }

    // 6. Run.
    let mut callback = StatusCallback::new(config.logging.report_every_steps);
    let result = runner::run_simulation(
        &mut simulation,
        &control,
        config.simulation.step_seconds,
        &mut callback,
    )
    .await
    .map_err(EngineError::from)?;

    // 7. Log results.
    runner::log_simulation_end(&result);
    let status = serde_json::to_string(&control.status(&simulation)).map_err(EngineError::from)?;
    info!(%status, "aether-engine shutdown complete");

    Ok(())
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the
/// configured level.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    if config.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the simulation configuration. Returns `None` if the file does not
/// exist.
fn load_config(path: &Path) -> Result<Option<SimulationConfig>, EngineError> {
    if path.exists() {
        Ok(Some(SimulationConfig::from_file(path)?))
    } else {
        Ok(None)
    }
}
