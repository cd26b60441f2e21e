//! Member spawner for seeding the session with initial spaces.
//!
//! Every configured space gets `members` members with a random known state
//! and random starting energy and attention. The generator is seeded from
//! the session config, so the same seed always yields the same session.

use presence_core::config::{SessionConfig, SpaceSeedConfig};
use presence_types::{FlowSpace, Member, MemberState};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Lowest starting energy or attention given to a spawned member.
const MIN_START_LEVEL: u32 = 20;

/// Highest starting energy or attention given to a spawned member.
const MAX_START_LEVEL: u32 = 80;

/// Build the starting spaces for a session.
///
/// The result is meant for a single `commit_spaces` call. Duplicate space
/// ids are passed through unchanged so the store can reject them.
pub fn seed_spaces(config: &SessionConfig) -> Vec<FlowSpace> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    config
        .spaces
        .iter()
        .map(|seed| spawn_space(&mut rng, seed))
        .collect()
}

/// Create one space and its members.
fn spawn_space(rng: &mut impl Rng, seed: &SpaceSeedConfig) -> FlowSpace {
    let name = seed.name.clone().unwrap_or_else(|| seed.id.clone());
    let members = (0..seed.members)
        .map(|n| spawn_member(rng, &format!("{}-{n}", seed.id)))
        .collect::<Vec<_>>();

    debug!(
        space_id = seed.id,
        member_count = members.len(),
        "Space seeded"
    );
    FlowSpace::new(seed.id.as_str(), name).with_members(members)
}

/// Create one member with a random known state and starting levels.
fn spawn_member(rng: &mut impl Rng, id: &str) -> Member {
    let idx = rng.random_range(0..MemberState::KNOWN.len());
    let state = MemberState::KNOWN
        .get(idx)
        .cloned()
        .unwrap_or_default();

    let mut member = Member::new(id, state);
    member.energy = rand_level(rng);
    member.attention = rand_level(rng);
    member
}

/// A random level in hundredths between the start bounds.
fn rand_level(rng: &mut impl Rng) -> f64 {
    let raw: u32 = rng.random_range(MIN_START_LEVEL..=MAX_START_LEVEL);
    f64::from(raw) / 100.0
}
