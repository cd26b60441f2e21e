//! Versioned state store for the presence state core.
//!
//! The store holds one canonical [`ConsciousnessState`] snapshot, replaces it
//! on every mutation, and notifies observers synchronously before the
//! mutation returns. Derived views (root energy, a single space) are thin
//! distinct-until-changed projections over the base observation.
//!
//! # Modules
//!
//! - [`store`] -- [`StateStore`] and the [`Subscription`] guard
//! - [`observe`] -- [`StateObserver`] trait and the [`Distinct`] projection
//! - [`resolver`] -- Flow lookup by scope id ([`FlowResolver`])
//! - [`error`] -- Mutation errors ([`StoreError`])
//!
//! [`ConsciousnessState`]: presence_types::ConsciousnessState

pub mod error;
pub mod observe;
pub mod resolver;
pub mod store;

pub use error::StoreError;
pub use observe::{Distinct, StateObserver};
pub use resolver::{FlowResolver, StoreFlowResolver};
pub use store::{StateStore, Subscription};
