//! Session clock, tick cycle, and run loop for the presence simulation.
//!
//! This crate ties the store and the propagation engine together: each tick
//! reads one snapshot, progresses and converges every space, and commits
//! the result back in a single store update.
//!
//! # Modules
//!
//! - [`clock`] -- Session clock with tick counter, fixed time delta, and
//!   elapsed session time.
//! - [`config`] -- Configuration loading from `presence-config.yaml` into
//!   strongly-typed structs.
//! - [`runner`] -- Async run loop with stop control and tick callbacks.
//! - [`tick`] -- The progress, interact, and commit cycle for one tick.

pub mod clock;
pub mod config;
pub mod runner;
pub mod tick;
