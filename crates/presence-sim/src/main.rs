//! Simulation binary for the presence engine.
//!
//! This is the entry point that wires together configuration, the state
//! store, the member spawner, and the run loop. It loads configuration,
//! seeds the session, and runs ticks until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `presence-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing), `RUST_LOG` overriding the
//!    configured level
//! 3. Create the session clock from the time config
//! 4. Seed spaces and members into a fresh store
//! 5. Subscribe a logging observer to the root energy
//! 6. Install the Ctrl-C stop handler
//! 7. Run the simulation loop
//! 8. Log the result

mod error;
mod session_callback;
mod spawner;

use std::path::Path;
use std::sync::Arc;

use presence_core::clock::SessionClock;
use presence_core::config::SimulationConfig;
use presence_core::runner::{self, RunControl, RunSettings};
use presence_store::StateStore;
use presence_types::EnergyState;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::SimError;
use crate::session_callback::SessionCallback;

/// Configuration file looked up in the working directory.
const CONFIG_PATH: &str = "presence-config.yaml";

/// Application entry point for the simulation.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), SimError> {
    // 1. Load configuration.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("presence-sim starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        seed = config.session.seed,
        spaces = config.session.spaces.len(),
        tick_interval_ms = config.time.tick_interval_ms,
        dt = config.time.dt,
        max_ticks = config.time.max_ticks,
        space_effect = ?config.propagation.space_effect,
        "Configuration loaded"
    );

    // 3. Create session clock.
    let mut clock = SessionClock::new(config.time.dt)?;

    // 4. Seed the store.
    let store = StateStore::new();
    let spaces = spawner::seed_spaces(&config.session);
    store.commit_spaces(spaces)?;
    let snapshot = store.snapshot();
    info!(
        spaces = snapshot.spaces.len(),
        members = snapshot.member_count(),
        "Session seeded"
    );

    // 5. Log root energy changes.
    let _energy_subscription = store.observe_energy(|energy: &EnergyState| {
        debug!(
            level = energy.level,
            quality = energy.quality,
            stability = energy.stability,
            protection = energy.protection,
            "Root energy changed"
        );
    });

    // 6. Stop cleanly on Ctrl-C.
    let control = Arc::new(RunControl::new());
    let stopper = Arc::clone(&control);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, stopping after the current tick");
                stopper.request_stop();
            }
            Err(e) => warn!(error = %e, "failed to listen for Ctrl-C"),
        }
    });

    // 7. Run the simulation.
    let engine = config.propagation.build_engine();
    let mut callback = SessionCallback::new();
    let result = runner::run_simulation(
        &mut clock,
        &store,
        &engine,
        RunSettings::from_config(&config),
        &control,
        &mut callback,
    )
    .await?;

    // 8. Log results.
    runner::log_simulation_end(&result);

    let last = store.snapshot();
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        elapsed = clock.elapsed(),
        root_energy = last.energy.level,
        store_version = store.version(),
        energy_folds = callback.folds(),
        "presence-sim shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration from `presence-config.yaml`.
///
/// Returns the configuration and whether it was read from disk.
fn load_config() -> Result<(SimulationConfig, bool), SimError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok((SimulationConfig::from_file(config_path)?, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}
