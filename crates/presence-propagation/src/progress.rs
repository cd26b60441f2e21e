//! Time-stepped progression of a single member.
//!
//! Each step adds a state-dependent effect to focus level and energy, and
//! the room's effect to focus quality and depth, each scaled by the time
//! delta and clamped to the unit range. All effects are non-negative, so a
//! step never lowers any of the four attributes.

use presence_types::{FlowSpace, Member, MemberState, clamp_unit};

use crate::error::PropagationError;
use crate::space::{SpaceEffect, sanitized_effect};

/// Effect of the `clear` state.
pub const CLEAR_EFFECT: f64 = 0.5;
/// Effect of the `active` state.
pub const ACTIVE_EFFECT: f64 = 0.3;
/// Effect of the `balanced` state.
pub const BALANCED_EFFECT: f64 = 0.4;
/// Effect of the `calm` state.
pub const CALM_EFFECT: f64 = 0.2;

/// Look up the progression effect of a member state.
///
/// The table covers exactly the four known states. There is no fallback.
pub fn state_effect(state: &MemberState) -> Result<f64, PropagationError> {
    match state {
        MemberState::Clear => Ok(CLEAR_EFFECT),
        MemberState::Active => Ok(ACTIVE_EFFECT),
        MemberState::Balanced => Ok(BALANCED_EFFECT),
        MemberState::Calm => Ok(CALM_EFFECT),
        MemberState::Unrecognized(tag) => Err(PropagationError::UnknownState(tag.clone())),
    }
}

/// Advance one member by `dt` in `room`.
///
/// Returns the updated member; the argument is left untouched.
///
/// # Order of operations
///
/// 1. Validate `dt` (finite, non-negative)
/// 2. Look up the state effect
/// 3. Evaluate the room's space effect
/// 4. Add `effect * dt` to focus level and energy, `space * dt` to focus
///    quality and depth, clamping each
pub fn progress<S: SpaceEffect + ?Sized>(
    member: &Member,
    room: &FlowSpace,
    dt: f64,
    strategy: &S,
) -> Result<Member, PropagationError> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(PropagationError::InvalidTimeDelta(dt));
    }

    let effect = state_effect(&member.state)?;
    let space = sanitized_effect(strategy, room);

    let mut next = member.clone();
    next.focus.level = clamp_unit(member.focus.level + effect * dt);
    next.focus.quality = clamp_unit(member.focus.quality + space * dt);
    next.energy = clamp_unit(member.energy + effect * dt);
    next.depth = clamp_unit(member.depth + space * dt);
    next.attention = clamp_unit(member.attention);

    Ok(next)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use presence_types::Focus;

    use super::*;
    use crate::space::ConstantSpaceEffect;

    const EPS: f64 = 1e-12;

    fn member(state: MemberState) -> Member {
        let mut m = Member::new("m1", state);
        m.focus = Focus::new(0.1, 0.1);
        m.energy = 0.2;
        m.attention = 0.3;
        m.depth = 0.0;
        m
    }

    fn room() -> FlowSpace {
        FlowSpace::new("hall", "Hall")
    }

    #[test]
    fn effect_table_is_total_over_known_states() {
        let effects: Vec<f64> = MemberState::KNOWN
            .iter()
            .map(|s| state_effect(s).unwrap())
            .collect();
        assert_eq!(effects, vec![0.5, 0.3, 0.4, 0.2]);
    }

    #[test]
    fn clear_state_with_unit_dt_adds_half_energy() {
        let m = member(MemberState::Clear);
        let next = progress(&m, &room(), 1.0, &ConstantSpaceEffect(0.0)).unwrap();
        assert!((next.energy - 0.7).abs() < EPS);
        assert!((next.focus.level - 0.6).abs() < EPS);
        // No room effect: quality and depth unchanged.
        assert!((next.focus.quality - 0.1).abs() < EPS);
        assert!(next.depth.abs() < EPS);
    }

    #[test]
    fn energy_clamps_at_one() {
        let mut m = member(MemberState::Clear);
        m.energy = 0.8;
        let next = progress(&m, &room(), 1.0, &ConstantSpaceEffect(0.0)).unwrap();
        assert!((next.energy - 1.0).abs() < EPS);
    }

    #[test]
    fn room_effect_drives_quality_and_depth() {
        let m = member(MemberState::Calm);
        let next = progress(&m, &room(), 0.5, &ConstantSpaceEffect(0.4)).unwrap();
        assert!((next.focus.quality - 0.3).abs() < EPS);
        assert!((next.depth - 0.2).abs() < EPS);
        assert!((next.energy - 0.3).abs() < EPS);
        assert!((next.attention - 0.3).abs() < EPS);
    }

    #[test]
    fn unknown_state_fails_without_default() {
        let m = member(MemberState::from("radiant"));
        let err = progress(&m, &room(), 1.0, &ConstantSpaceEffect::default()).unwrap_err();
        assert_eq!(err, PropagationError::UnknownState("radiant".to_owned()));
    }

    #[test]
    fn invalid_dt_is_rejected() {
        let m = member(MemberState::Clear);
        for dt in [-0.1, f64::NAN, f64::INFINITY] {
            assert!(progress(&m, &room(), dt, &ConstantSpaceEffect::default()).is_err());
        }
    }

    #[test]
    fn progress_never_decreases_and_leaves_input_untouched() {
        let strategy = ConstantSpaceEffect::default();
        for state in MemberState::KNOWN {
            let m = member(state);
            let before = m.clone();
            let mut current = m.clone();
            for step in 0..20 {
                let dt = f64::from(step) * 0.07;
                let next = progress(&current, &room(), dt, &strategy).unwrap();
                assert!(next.focus.level >= current.focus.level);
                assert!(next.focus.quality >= current.focus.quality);
                assert!(next.energy >= current.energy);
                assert!(next.depth >= current.depth);
                assert!(next.is_within_bounds());
                current = next;
            }
            assert_eq!(m, before);
        }
    }
}
