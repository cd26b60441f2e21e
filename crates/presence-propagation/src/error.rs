//! Error types for the presence-propagation crate.
//!
//! Propagation is pure and deterministic, so every error is local to the
//! call that raised it and retrying with the same input is pointless.

/// Errors that can occur while progressing a member.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropagationError {
    /// The member's state tag has no entry in the state-effect table.
    #[error("unknown member state: {0:?}")]
    UnknownState(String),

    /// The time delta was negative, infinite, or `NaN`.
    #[error("invalid time delta: {0}")]
    InvalidTimeDelta(f64),
}
