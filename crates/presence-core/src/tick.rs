//! One simulation step over every space in the store.
//!
//! Each tick:
//!
//! 1. **Progress** -- advance every member of every space by the delta.
//! 2. **Interact** -- run one peer-convergence step per space over the
//!    progressed members.
//! 3. **Advance** -- move the clock forward by one delta.
//! 4. **Commit** -- write all updated spaces back in a single store commit.
//!
//! All four steps run inside one [`StateStore::update_spaces`] call, so no
//! other store mutation can land between the snapshot a tick reads and the
//! spaces it writes. The propagation engine never mutates the store; this
//! module is the caller that applies its results. If a tick fails, nothing
//! is committed, the clock does not move, and observers see no emission.

use presence_propagation::{PropagationEngine, PropagationError, SpaceEffect};
use presence_store::{StateStore, StoreError};
use presence_types::{ConsciousnessState, FlowSpace, Member, MemberId, SpaceId};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::clock::{ClockError, SessionClock};

/// What a tick does with a member whose state has no effect entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownStatePolicy {
    /// Leave the member's attributes as they are and keep going. The member
    /// still takes part in interaction.
    #[default]
    Skip,
    /// Abort the whole tick.
    Halt,
}

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Progressing a member failed under [`UnknownStatePolicy::Halt`], or the
    /// time delta was rejected.
    #[error("propagation error for member {member_id} in {space_id}: {source}")]
    Propagation {
        /// The space the member is in.
        space_id: SpaceId,
        /// The member that could not be progressed.
        member_id: MemberId,
        /// The underlying propagation error.
        source: PropagationError,
    },

    /// Committing the updated spaces failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Number of spaces stepped.
    pub spaces: u32,
    /// Members whose progression succeeded.
    pub members_progressed: u32,
    /// Members left unchanged because their state is unknown.
    pub members_skipped: u32,
    /// Mean member energy after the tick, if any members are present.
    pub mean_energy: Option<f64>,
    /// Store version after the commit.
    pub version: u64,
}

/// Per-space outcome of the progress and interact phases.
struct SpaceStep {
    space: FlowSpace,
    progressed: u32,
    skipped: u32,
}

/// Progress and interact every member of one space.
fn step_space<S: SpaceEffect>(
    space: &FlowSpace,
    dt: f64,
    engine: &PropagationEngine<S>,
    policy: UnknownStatePolicy,
) -> Result<SpaceStep, TickError> {
    let mut progressed: u32 = 0;
    let mut skipped: u32 = 0;
    let mut members: Vec<Member> = Vec::with_capacity(space.members.len());

    for member in &space.members {
        match engine.progress(member, space, dt) {
            Ok(next) => {
                progressed = progressed.saturating_add(1);
                members.push(next);
            }
            Err(PropagationError::UnknownState(tag)) if policy == UnknownStatePolicy::Skip => {
                warn!(
                    space = %space.id,
                    member = %member.id,
                    state = %tag,
                    "unknown member state, skipping progression"
                );
                skipped = skipped.saturating_add(1);
                members.push(member.clone());
            }
            Err(source) => {
                return Err(TickError::Propagation {
                    space_id: space.id.clone(),
                    member_id: member.id.clone(),
                    source,
                });
            }
        }
    }

    let mut next = space.clone();
    next.members = engine.interact(&members, space);

    Ok(SpaceStep {
        space: next,
        progressed,
        skipped,
    })
}

/// Step every space of `snapshot` and advance the clock.
///
/// Returns the updated spaces and a summary whose `version` is not yet set.
fn step_all<S: SpaceEffect>(
    snapshot: &ConsciousnessState,
    clock: &mut SessionClock,
    engine: &PropagationEngine<S>,
    policy: UnknownStatePolicy,
) -> Result<(Vec<FlowSpace>, TickSummary), TickError> {
    // Step every space before touching the clock so a failed tick can be
    // retried with the same tick number.
    let mut steps = Vec::with_capacity(snapshot.spaces.len());
    for space in snapshot.spaces.values() {
        steps.push(step_space(space, clock.dt(), engine, policy)?);
    }

    let tick = clock.advance()?;

    let mut summary = TickSummary {
        tick,
        spaces: 0,
        members_progressed: 0,
        members_skipped: 0,
        mean_energy: None,
        version: 0,
    };
    let mut member_total: u32 = 0;
    let mut energy_sum = 0.0;
    let mut updated = Vec::with_capacity(steps.len());
    for step in steps {
        summary.spaces = summary.spaces.saturating_add(1);
        summary.members_progressed = summary.members_progressed.saturating_add(step.progressed);
        summary.members_skipped = summary.members_skipped.saturating_add(step.skipped);
        for member in &step.space.members {
            member_total = member_total.saturating_add(1);
            energy_sum += member.energy;
        }
        updated.push(step.space);
    }
    summary.mean_energy = (member_total > 0).then(|| energy_sum / f64::from(member_total));

    Ok((updated, summary))
}

/// Execute one tick against the store.
///
/// The whole tick runs inside one store commit. Mutations issued by other
/// threads wait for it and land afterwards.
///
/// # Errors
///
/// Returns [`TickError`] if the clock overflows, a member fails to
/// progress under [`UnknownStatePolicy::Halt`], or the commit fails. The
/// store is left unchanged on error.
pub fn run_tick<S: SpaceEffect>(
    clock: &mut SessionClock,
    store: &StateStore,
    engine: &PropagationEngine<S>,
    policy: UnknownStatePolicy,
) -> Result<TickSummary, TickError> {
    let (summary, version) =
        store.update_spaces(|snapshot| step_all(snapshot, clock, engine, policy))?;
    let summary = TickSummary { version, ..summary };

    debug!(
        tick = summary.tick,
        spaces = summary.spaces,
        members_progressed = summary.members_progressed,
        members_skipped = summary.members_skipped,
        mean_energy = ?summary.mean_energy,
        version,
        "tick complete"
    );

    Ok(summary)
}
