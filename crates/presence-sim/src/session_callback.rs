//! Tick callback that logs progress and keeps the root energy current.
//!
//! After each tick the mean member energy becomes the root
//! `energy.level`, so root-level energy observers follow the session.

use presence_core::runner::TickCallback;
use presence_core::tick::TickSummary;
use presence_store::StateStore;
use tracing::{info, warn};

/// Callback that bridges the tick cycle to the root energy state.
#[derive(Debug, Default)]
pub struct SessionCallback {
    folds: u64,
}

impl SessionCallback {
    /// Create a new session callback.
    pub const fn new() -> Self {
        Self { folds: 0 }
    }

    /// Number of ticks whose mean energy was written to the root.
    pub const fn folds(&self) -> u64 {
        self.folds
    }
}

impl TickCallback for SessionCallback {
    fn on_tick(&mut self, summary: &TickSummary, store: &StateStore) {
        info!(
            tick = summary.tick,
            spaces = summary.spaces,
            progressed = summary.members_progressed,
            skipped = summary.members_skipped,
            mean_energy = ?summary.mean_energy,
            "Tick complete"
        );

        let Some(mean) = summary.mean_energy else {
            return;
        };
        match store.set_energy_level(mean) {
            Ok(()) => self.folds = self.folds.saturating_add(1),
            Err(e) => warn!(tick = summary.tick, error = %e, "failed to fold session energy"),
        }
    }
}
