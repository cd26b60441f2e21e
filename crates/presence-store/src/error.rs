//! Error types for the presence-store crate.

use presence_types::{ScopeId, SpaceId};

/// Errors returned by state store mutations.
///
/// A failed mutation leaves the previous snapshot in place and emits nothing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The `(from, to)` edge is already present.
    #[error("duplicate connection: {from} -> {to}")]
    DuplicateConnection {
        /// Source of the rejected edge.
        from: ScopeId,
        /// Target of the rejected edge.
        to: ScopeId,
    },

    /// A batch of spaces named the same id twice.
    #[error("duplicate space in batch: {0}")]
    DuplicateSpace(SpaceId),

    /// Depth can only grow; the delta was negative or not finite.
    #[error("invalid depth delta: {0}")]
    InvalidDepthDelta(f64),

    /// An observer tried to mutate the store while it was being notified.
    #[error("state update issued from inside an observer notification")]
    ReentrantUpdate,
}
