//! Space-effect strategies.
//!
//! A room contributes one scalar to progression. How that scalar is derived
//! from the room is pluggable; [`ConstantSpaceEffect`] with 1.0 is the
//! default.

use presence_types::FlowSpace;

/// Derives the scalar effect a room has on the members present in it.
///
/// Implementations must be deterministic for a given room. Negative or
/// non-finite results are treated as 0.0 by the engine.
pub trait SpaceEffect: Send + Sync {
    /// The effect of this room.
    fn space_effect(&self, room: &FlowSpace) -> f64;
}

/// Every room has the same effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantSpaceEffect(pub f64);

impl Default for ConstantSpaceEffect {
    fn default() -> Self {
        Self(1.0)
    }
}

impl SpaceEffect for ConstantSpaceEffect {
    fn space_effect(&self, _room: &FlowSpace) -> f64 {
        self.0
    }
}

/// A room's effect is the mean of its five flow fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowSpaceEffect;

impl SpaceEffect for FlowSpaceEffect {
    fn space_effect(&self, room: &FlowSpace) -> f64 {
        room.flow.clamped().mean()
    }
}

impl<S: SpaceEffect + ?Sized> SpaceEffect for Box<S> {
    fn space_effect(&self, room: &FlowSpace) -> f64 {
        (**self).space_effect(room)
    }
}

/// Evaluate a strategy and sanitize its result to a finite non-negative value.
pub(crate) fn sanitized_effect<S: SpaceEffect + ?Sized>(strategy: &S, room: &FlowSpace) -> f64 {
    let raw = strategy.space_effect(room);
    if raw.is_finite() && raw > 0.0 { raw } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use presence_types::NaturalFlow;

    use super::*;

    #[test]
    fn constant_default_is_one() {
        let room = FlowSpace::new("hall", "Hall");
        assert!((ConstantSpaceEffect::default().space_effect(&room) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn flow_effect_is_mean_of_flow() {
        let mut room = FlowSpace::new("hall", "Hall");
        room.flow = NaturalFlow {
            rhythm: 0.1,
            resonance: 0.2,
            coherence: 0.3,
            presence: 0.4,
            harmony: 0.5,
        };
        assert!((FlowSpaceEffect.space_effect(&room) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn negative_and_nan_effects_are_zeroed() {
        let room = FlowSpace::new("hall", "Hall");
        assert!(sanitized_effect(&ConstantSpaceEffect(-2.0), &room).abs() < 1e-12);
        assert!(sanitized_effect(&ConstantSpaceEffect(f64::NAN), &room).abs() < 1e-12);
    }
}
