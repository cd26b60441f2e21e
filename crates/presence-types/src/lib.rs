//! Shared type definitions for the presence state core.
//!
//! This crate is the single source of truth for the snapshot types that the
//! state store publishes and the propagation engine transforms. Types defined
//! here flow downstream to `TypeScript` via `ts-rs` for whatever renders the
//! state.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe string identifiers for scopes, spaces, and members
//! - [`enums`] -- Closed enumerations with an escape value for unknown tags
//! - [`structs`] -- Snapshot records and the unit-range clamping helper

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{MemberState, ScopeKind};
pub use ids::{MemberId, ROOT_SCOPE_ID, ScopeId, SpaceId};
pub use structs::{
    Connection, ConsciousnessState, EnergyState, FlowSpace, Focus, Member, NaturalFlow,
    NaturalFlowPatch, SESSION_DEFAULT_LEVEL, clamp_unit, is_unit,
};
