//! Propagation engine for the presence state core.
//!
//! Pure functions that compute how members evolve over time and how they
//! pull on each other when they share a room. Nothing here touches the
//! state store: callers apply the returned values themselves.
//!
//! # Modules
//!
//! - [`progress`] -- State-effect table and single-member progression
//! - [`interact`] -- Peer convergence of energy and attention
//! - [`space`] -- Pluggable room effect ([`SpaceEffect`])
//! - [`engine`] -- [`PropagationEngine`] bundling strategy and constants
//! - [`config`] -- Interaction step sizes ([`PropagationConfig`])
//! - [`error`] -- [`PropagationError`]

pub mod config;
pub mod engine;
pub mod error;
pub mod interact;
pub mod progress;
pub mod space;

pub use config::PropagationConfig;
pub use engine::PropagationEngine;
pub use error::PropagationError;
pub use progress::state_effect;
pub use space::{ConstantSpaceEffect, FlowSpaceEffect, SpaceEffect};
