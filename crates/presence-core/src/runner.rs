//! Simulation loop runner.
//!
//! [`run_simulation`] drives [`run_tick`] repeatedly with:
//!
//! - **Bounded runs**: stop after `max_ticks` (0 means run until stopped)
//! - **Stop requests**: [`RunControl::request_stop`] ends the loop before the
//!   next tick
//! - **Tick pacing**: an optional wall-clock pause between ticks
//! - **Empty sessions**: the loop ends when no space has any members
//!
//! [`run_tick`]: crate::tick::run_tick

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use presence_propagation::{PropagationEngine, SpaceEffect};
use presence_store::StateStore;
use tokio::sync::Notify;
use tracing::{info, warn};

use crate::clock::SessionClock;
use crate::config::SimulationConfig;
use crate::tick::{self, TickError, TickSummary, UnknownStatePolicy};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Reason why the simulation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationEndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// A stop was requested through [`RunControl`].
    StopRequested,
    /// No space had any members left to step.
    NoMembers,
}

/// Loop parameters, usually taken from [`SimulationConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    /// Stop after this many ticks (0 = run until stopped).
    pub max_ticks: u64,
    /// Pause between ticks in milliseconds.
    pub tick_interval_ms: u64,
    /// Handling of members with unknown states.
    pub unknown_state_policy: UnknownStatePolicy,
}

impl RunSettings {
    /// Extract the loop parameters from a full configuration.
    pub const fn from_config(config: &SimulationConfig) -> Self {
        Self {
            max_ticks: config.time.max_ticks,
            tick_interval_ms: config.time.tick_interval_ms,
            unknown_state_policy: config.propagation.unknown_state_policy,
        }
    }

    /// Whether `tick` is the last tick allowed.
    pub const fn tick_limit_reached(&self, tick: u64) -> bool {
        self.max_ticks > 0 && tick >= self.max_ticks
    }
}

/// Shared stop flag for a running loop.
///
/// Wrap in an `Arc` to stop the loop from another task.
#[derive(Debug, Default)]
pub struct RunControl {
    stop_requested: AtomicBool,
    wake: Notify,
}

impl RunControl {
    /// Create a control with no stop requested.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a clean stop. Interrupts a pending inter-tick pause.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Check whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Sleep for `ms` milliseconds unless a stop is requested first.
    async fn pause(&self, ms: u64) {
        if ms == 0 || self.is_stop_requested() {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(tokio::time::Duration::from_millis(ms)) => {}
            () = self.wake.notified() => {}
        }
    }
}

/// Result of the simulation run.
#[derive(Debug, Clone)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Wall-clock time when the loop started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time when the loop ended.
    pub ended_at: DateTime<Utc>,
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, store: &StateStore);
}

/// A no-op tick callback for testing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _store: &StateStore) {}
}

/// Run the simulation loop until a termination condition is met.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails. The store keeps the last
/// successfully committed snapshot.
pub async fn run_simulation<S: SpaceEffect>(
    clock: &mut SessionClock,
    store: &StateStore,
    engine: &PropagationEngine<S>,
    settings: RunSettings,
    control: &RunControl,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let started_at = Utc::now();
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = settings.max_ticks,
        tick_interval_ms = settings.tick_interval_ms,
        dt = clock.dt(),
        "Simulation starting"
    );

    let end_reason = loop {
        if control.is_stop_requested() {
            info!("Stop requested");
            break SimulationEndReason::StopRequested;
        }

        if store.snapshot().member_count() == 0 {
            info!(tick = clock.tick(), "No members present");
            break SimulationEndReason::NoMembers;
        }

        let summary = tick::run_tick(clock, store, engine, settings.unknown_state_policy)?;
        total_ticks = total_ticks.saturating_add(1);

        callback.on_tick(&summary, store);

        let reached = settings.tick_limit_reached(summary.tick);
        last_summary = Some(summary);
        if reached {
            info!(
                tick = clock.tick(),
                max_ticks = settings.max_ticks,
                "Tick limit reached"
            );
            break SimulationEndReason::MaxTicksReached;
        }

        control.pause(settings.tick_interval_ms).await;
    };

    Ok(SimulationResult {
        end_reason,
        final_summary: last_summary,
        total_ticks,
        started_at,
        ended_at: Utc::now(),
    })
}

/// Log the simulation end.
pub fn log_simulation_end(result: &SimulationResult) {
    let elapsed_ms = result
        .ended_at
        .signed_duration_since(result.started_at)
        .num_milliseconds();
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        elapsed_ms,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        final_mean_energy = result.final_summary.as_ref().and_then(|s| s.mean_energy),
        "Simulation ended"
    );

    if result.final_summary.is_none() {
        warn!("Simulation ended with no ticks executed");
    }
}
