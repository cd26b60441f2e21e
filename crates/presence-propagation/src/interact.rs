//! Peer interaction within a room.
//!
//! Every member moves a fixed fraction of the way toward the mean energy and
//! mean attention of the other members present. All means are taken from
//! the input slice before any update, so the result does not depend on
//! evaluation order. A member alone in the room is unchanged.

use presence_types::{FlowSpace, Member, clamp_unit};

use crate::config::PropagationConfig;

/// Energy and attention totals over a room, for leave-one-out peer means.
struct RoomTotals {
    count: u32,
    energy: f64,
    attention: f64,
}

impl RoomTotals {
    fn of(members: &[Member]) -> Self {
        members.iter().fold(
            Self {
                count: 0,
                energy: 0.0,
                attention: 0.0,
            },
            |acc, m| Self {
                count: acc.count.saturating_add(1),
                energy: acc.energy + m.energy,
                attention: acc.attention + m.attention,
            },
        )
    }

    /// Mean energy and attention of everyone except `member`.
    ///
    /// Returns `None` when there is nobody else.
    fn peer_means(&self, member: &Member) -> Option<(f64, f64)> {
        let peers = self.count.checked_sub(1).filter(|n| *n > 0)?;
        let n = f64::from(peers);
        Some((
            (self.energy - member.energy) / n,
            (self.attention - member.attention) / n,
        ))
    }
}

/// Run one interaction step over the members present in a room.
///
/// Returns the updated members in input order. The room is accepted for
/// environmental modulation but does not currently affect the result.
pub fn interact(members: &[Member], _room: &FlowSpace, config: &PropagationConfig) -> Vec<Member> {
    let energy_step = clamp_unit(config.energy_step);
    let attention_step = clamp_unit(config.attention_step);
    let totals = RoomTotals::of(members);

    members
        .iter()
        .map(|member| {
            let Some((mean_energy, mean_attention)) = totals.peer_means(member) else {
                return member.clone();
            };
            let mut next = member.clone();
            next.energy = clamp_unit(member.energy + (mean_energy - member.energy) * energy_step);
            next.attention = clamp_unit(
                member.attention + (mean_attention - member.attention) * attention_step,
            );
            next
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use presence_types::MemberState;

    use super::*;

    const EPS: f64 = 1e-9;

    fn member(id: &str, energy: f64, attention: f64) -> Member {
        let mut m = Member::new(id, MemberState::Balanced);
        m.energy = energy;
        m.attention = attention;
        m
    }

    fn room() -> FlowSpace {
        FlowSpace::new("hall", "Hall")
    }

    #[test]
    fn two_members_close_ten_percent_of_the_gap() {
        let members = vec![member("a", 0.9, 0.5), member("b", 0.1, 0.5)];
        let next = interact(&members, &room(), &PropagationConfig::default());
        assert!((next[0].energy - 0.82).abs() < EPS);
        assert!((next[1].energy - 0.18).abs() < EPS);
    }

    #[test]
    fn repeated_interaction_converges_without_overshoot() {
        let mut members = vec![member("a", 0.9, 0.9), member("b", 0.1, 0.1)];
        let cfg = PropagationConfig::default();
        for _ in 0..200 {
            let next = interact(&members, &room(), &cfg);
            assert!(next[0].energy >= 0.5 - EPS);
            assert!(next[1].energy <= 0.5 + EPS);
            assert!(next[0].energy <= members[0].energy + EPS);
            assert!(next[1].energy >= members[1].energy - EPS);
            members = next;
        }
        assert!((members[0].energy - 0.5).abs() < 1e-6);
        assert!((members[1].energy - 0.5).abs() < 1e-6);
    }

    #[test]
    fn attention_converges_slower_than_energy() {
        let members = vec![member("a", 0.9, 0.9), member("b", 0.1, 0.1)];
        let next = interact(&members, &room(), &PropagationConfig::default());
        let energy_gap = next[0].energy - next[1].energy;
        let attention_gap = next[0].attention - next[1].attention;
        assert!(attention_gap > energy_gap);
        assert!((attention_gap - 0.72).abs() < EPS);
        assert!((energy_gap - 0.64).abs() < EPS);
    }

    #[test]
    fn lone_member_is_unchanged() {
        let members = vec![member("solo", 0.3, 0.7)];
        let next = interact(&members, &room(), &PropagationConfig::default());
        assert_eq!(next, members);
    }

    #[test]
    fn empty_room_yields_nothing() {
        assert!(interact(&[], &room(), &PropagationConfig::default()).is_empty());
    }

    #[test]
    fn result_is_independent_of_input_order() {
        let cfg = PropagationConfig::default();
        let forward = vec![member("a", 0.9, 0.2), member("b", 0.4, 0.6), member("c", 0.1, 1.0)];
        let reversed: Vec<Member> = forward.iter().rev().cloned().collect();

        let a = interact(&forward, &room(), &cfg);
        let mut b = interact(&reversed, &room(), &cfg);
        b.reverse();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x.id, y.id);
            assert!((x.energy - y.energy).abs() < EPS);
            assert!((x.attention - y.attention).abs() < EPS);
        }
        // Each moves toward the mean of the other two.
        assert!((a[0].energy - (0.9 + (0.25 - 0.9) * 0.1)).abs() < EPS);
    }

    #[test]
    fn each_member_targets_the_mean_of_the_others() {
        let members: Vec<Member> = [0.1, 0.3, 0.5, 0.7, 0.9]
            .iter()
            .enumerate()
            .map(|(i, e)| member(&format!("m{i}"), *e, 1.0 - *e))
            .collect();
        let next = interact(&members, &room(), &PropagationConfig::default());

        for (before, after) in members.iter().zip(&next) {
            let others: Vec<&Member> = members.iter().filter(|m| m.id != before.id).collect();
            let mean_energy = others.iter().map(|m| m.energy).sum::<f64>() / 4.0;
            let mean_attention = others.iter().map(|m| m.attention).sum::<f64>() / 4.0;
            let energy = before.energy + (mean_energy - before.energy) * 0.1;
            let attention = before.attention + (mean_attention - before.attention) * 0.05;
            assert!((after.energy - energy).abs() < EPS, "{}", before.id);
            assert!((after.attention - attention).abs() < EPS, "{}", before.id);
        }
    }
}
