//! Bundles a space-effect strategy with the interaction constants.

use presence_types::{FlowSpace, Member};
use tracing::debug;

use crate::config::PropagationConfig;
use crate::error::PropagationError;
use crate::interact;
use crate::progress;
use crate::space::{ConstantSpaceEffect, SpaceEffect};

/// Pure propagation engine.
///
/// Holds no mutable state between calls: the same inputs always give the
/// same outputs. Callers persist results themselves.
#[derive(Debug, Clone, Default)]
pub struct PropagationEngine<S = ConstantSpaceEffect> {
    config: PropagationConfig,
    strategy: S,
}

impl<S: SpaceEffect> PropagationEngine<S> {
    /// Create an engine with explicit constants and strategy.
    pub const fn new(config: PropagationConfig, strategy: S) -> Self {
        Self { config, strategy }
    }

    /// The interaction constants in use.
    pub const fn config(&self) -> &PropagationConfig {
        &self.config
    }

    /// The space-effect strategy in use.
    pub const fn strategy(&self) -> &S {
        &self.strategy
    }

    /// The effect `room` has on members present in it.
    pub fn space_effect(&self, room: &FlowSpace) -> f64 {
        crate::space::sanitized_effect(&self.strategy, room)
    }

    /// Advance one member by `dt` in `room`. See [`progress::progress`].
    pub fn progress(
        &self,
        member: &Member,
        room: &FlowSpace,
        dt: f64,
    ) -> Result<Member, PropagationError> {
        progress::progress(member, room, dt, &self.strategy)
    }

    /// One interaction step over the members present. See
    /// [`interact::interact`].
    pub fn interact(&self, members: &[Member], room: &FlowSpace) -> Vec<Member> {
        debug!(room = %room.id, members = members.len(), "interaction step");
        interact::interact(members, room, &self.config)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use presence_types::MemberState;

    use super::*;
    use crate::space::FlowSpaceEffect;

    #[test]
    fn default_engine_uses_unit_room_effect() {
        let engine = PropagationEngine::<ConstantSpaceEffect>::default();
        let room = FlowSpace::new("hall", "Hall");
        let m = Member::new("m1", MemberState::Calm);
        let next = engine.progress(&m, &room, 0.1).unwrap();
        assert!((next.depth - 0.1).abs() < 1e-12);
        assert!((engine.space_effect(&room) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn boxed_strategy_is_usable() {
        let strategy: Box<dyn SpaceEffect> = Box::new(FlowSpaceEffect);
        let engine = PropagationEngine::new(PropagationConfig::default(), strategy);
        let room = FlowSpace::new("hall", "Hall");
        assert!((engine.space_effect(&room) - 0.5).abs() < 1e-12);
    }
}
