//! Error types for the simulation binary.
//!
//! [`SimError`] is the top-level error type that wraps all possible
//! failure modes during startup and the simulation run.

/// Top-level error for the simulation binary.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: presence_core::config::ConfigError,
    },

    /// Session clock initialization failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: presence_core::clock::ClockError,
    },

    /// Seeding the store failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: presence_store::StoreError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: presence_core::runner::RunnerError,
    },
}
