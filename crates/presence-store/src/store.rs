//! The canonical state holder.
//!
//! [`StateStore`] owns the single current [`ConsciousnessState`] snapshot.
//! Every mutation runs under a publish lock so that "read snapshot, compute
//! next snapshot, publish" is linearizable, and every observer registered
//! when a commit starts is called synchronously before the mutation returns.
//!
//! # Locking
//!
//! - `publish` serializes commits and registrations. It is held while a
//!   mutation computes its next snapshot and while observers run.
//! - `inner` guards the snapshot and the observer list. It is held only to
//!   swap the snapshot or copy the list, never while user code runs.
//!
//! Observers and [`StateStore::update_spaces`] closures may read the store
//! and register new observers. A mutation issued from either on the
//! publishing thread fails with [`StoreError::ReentrantUpdate`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::{self, ThreadId};

use presence_types::{
    Connection, ConsciousnessState, EnergyState, FlowSpace, NaturalFlowPatch, ScopeId, SpaceId,
    clamp_unit,
};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::observe::{Distinct, StateObserver};

/// An observer shared between the registry and the delivery loop.
type SharedObserver = Arc<Mutex<dyn StateObserver>>;

/// Outcome of a mutation closure.
enum Change {
    /// Publish this state as the next snapshot.
    Commit(ConsciousnessState),
    /// Nothing changed; no snapshot is produced.
    Unchanged,
}

/// Snapshot, version, and observer registry.
struct Inner {
    snapshot: Arc<ConsciousnessState>,
    version: u64,
    next_subscription: u64,
    observers: Vec<(u64, SharedObserver)>,
}

/// State shared by the store handle and its subscriptions.
struct Shared {
    publish: Mutex<()>,
    publisher: Mutex<Option<ThreadId>>,
    inner: Mutex<Inner>,
    watch_tx: watch::Sender<Arc<ConsciousnessState>>,
}

/// Lock a mutex, recovering the guard if a previous holder panicked.
///
/// Every guarded value here is replaced in single assignments, so a
/// poisoned lock still protects a consistent value.
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks the current thread as the publisher until dropped.
struct PublishGuard<'a> {
    publisher: &'a Mutex<Option<ThreadId>>,
}

impl<'a> PublishGuard<'a> {
    fn enter(publisher: &'a Mutex<Option<ThreadId>>) -> Self {
        *lock(publisher) = Some(thread::current().id());
        Self { publisher }
    }
}

impl Drop for PublishGuard<'_> {
    fn drop(&mut self) {
        *lock(self.publisher) = None;
    }
}

impl Shared {
    fn is_publishing_thread(&self) -> bool {
        *lock(&self.publisher) == Some(thread::current().id())
    }

    /// Run `f` against the current snapshot and publish its result.
    fn commit<R, E>(
        &self,
        op: &'static str,
        f: impl FnOnce(&ConsciousnessState) -> Result<(Change, R), E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        self.commit_versioned(op, f).map(|(out, _)| out)
    }

    /// Like [`Shared::commit`], also returning the version after the call.
    ///
    /// `f` runs under the publish lock but not the inner lock, so it may
    /// read the store. Only commits replace the snapshot and they all hold
    /// the publish lock, so the snapshot `f` sees is still current when its
    /// result is published.
    fn commit_versioned<R, E>(
        &self,
        op: &'static str,
        f: impl FnOnce(&ConsciousnessState) -> Result<(Change, R), E>,
    ) -> Result<(R, u64), E>
    where
        E: From<StoreError>,
    {
        if self.is_publishing_thread() {
            warn!(op, "rejected state update issued during notification");
            return Err(StoreError::ReentrantUpdate.into());
        }

        let _serial = lock(&self.publish);
        let _publishing = PublishGuard::enter(&self.publisher);

        let current = Arc::clone(&lock(&self.inner).snapshot);
        let (change, out) = f(&current)?;
        let Change::Commit(state) = change else {
            let version = lock(&self.inner).version;
            debug!(op, version, "state unchanged");
            return Ok((out, version));
        };

        let next = Arc::new(state);
        let (observers, version) = {
            let mut inner = lock(&self.inner);
            inner.snapshot = Arc::clone(&next);
            inner.version = inner.version.saturating_add(1);
            let observers: Vec<SharedObserver> =
                inner.observers.iter().map(|(_, o)| Arc::clone(o)).collect();
            (observers, inner.version)
        };

        self.watch_tx.send_replace(Arc::clone(&next));

        debug!(op, version, observers = observers.len(), "state committed");
        for observer in &observers {
            lock(&**observer).on_state(&next);
        }

        Ok((out, version))
    }

    fn unsubscribe(&self, id: u64) {
        let mut inner = lock(&self.inner);
        inner.observers.retain(|(sid, _)| *sid != id);
    }
}

/// Handle to a registered observer. Dropping it ends the observation.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
}

impl Subscription {
    /// The registry id of this subscription.
    pub const fn id(&self) -> u64 {
        self.id
    }
}

impl core::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.unsubscribe(self.id);
        }
    }
}

/// Single source of truth for the session's [`ConsciousnessState`].
///
/// Cloning the handle is cheap; all clones share the same state.
#[derive(Clone)]
pub struct StateStore {
    shared: Arc<Shared>,
}

impl StateStore {
    /// Create a store holding the session defaults.
    pub fn new() -> Self {
        Self::with_state(ConsciousnessState::new_root())
    }

    /// Create a store holding the given initial state.
    pub fn with_state(initial: ConsciousnessState) -> Self {
        let snapshot = Arc::new(initial);
        let (watch_tx, _) = watch::channel(Arc::clone(&snapshot));
        Self {
            shared: Arc::new(Shared {
                publish: Mutex::new(()),
                publisher: Mutex::new(None),
                inner: Mutex::new(Inner {
                    snapshot,
                    version: 0,
                    next_subscription: 0,
                    observers: Vec::new(),
                }),
                watch_tx,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<ConsciousnessState> {
        Arc::clone(&lock(&self.shared.inner).snapshot)
    }

    /// Number of snapshots committed since the store was created.
    pub fn version(&self) -> u64 {
        lock(&self.shared.inner).version
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        lock(&self.shared.inner).observers.len()
    }

    /// A latest-value channel for async consumers.
    ///
    /// The receiver starts at the current snapshot. Intermediate snapshots
    /// may be skipped if the receiver falls behind.
    pub fn watch(&self) -> watch::Receiver<Arc<ConsciousnessState>> {
        self.shared.watch_tx.subscribe()
    }

    // -----------------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------------

    /// Observe every snapshot.
    ///
    /// The observer is called immediately with the current snapshot, then
    /// once per subsequent commit. An observer registered while a commit is
    /// being delivered does not receive that commit.
    pub fn observe_state<O>(&self, observer: O) -> Subscription
    where
        O: StateObserver + 'static,
    {
        let observer: SharedObserver = Arc::new(Mutex::new(observer));

        // Registration from inside a notification already runs under the
        // publish lock on this thread.
        let (_serial, _publishing) = if self.shared.is_publishing_thread() {
            (None, None)
        } else {
            let serial = lock(&self.shared.publish);
            (Some(serial), Some(PublishGuard::enter(&self.shared.publisher)))
        };

        let (id, current) = {
            let mut inner = lock(&self.shared.inner);
            let id = inner.next_subscription;
            inner.next_subscription = inner.next_subscription.saturating_add(1);
            inner.observers.push((id, Arc::clone(&observer)));
            (id, Arc::clone(&inner.snapshot))
        };

        lock(&*observer).on_state(&current);

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Observe the root energy, skipping commits that leave it equal.
    pub fn observe_energy<S>(&self, mut sink: S) -> Subscription
    where
        S: FnMut(&EnergyState) + Send + 'static,
    {
        self.observe_state(Distinct::new(
            |state: &ConsciousnessState| state.energy,
            move |energy: &EnergyState| sink(energy),
        ))
    }

    /// Observe one space by id, skipping commits that leave it equal.
    ///
    /// The sink receives `None` while no space with that id exists.
    pub fn observe_space<S>(&self, id: SpaceId, mut sink: S) -> Subscription
    where
        S: FnMut(Option<&FlowSpace>) + Send + 'static,
    {
        self.observe_state(Distinct::new(
            move |state: &ConsciousnessState| state.space(&id).cloned(),
            move |space: &Option<FlowSpace>| sink(space.as_ref()),
        ))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Merge a partial flow update over the root flow.
    pub fn update_flow(&self, patch: &NaturalFlowPatch) -> Result<(), StoreError> {
        self.shared.commit("update_flow", |current| {
            let mut next = current.clone();
            next.flow = current.flow.merge(patch);
            Ok((Change::Commit(next), ()))
        })
    }

    /// Replace the root energy wholesale.
    pub fn update_energy(&self, energy: EnergyState) -> Result<(), StoreError> {
        self.shared.commit("update_energy", |current| {
            let mut next = current.clone();
            next.energy = energy.clamped();
            Ok((Change::Commit(next), ()))
        })
    }

    /// Set only the root energy level, keeping the other energy fields.
    pub fn set_energy_level(&self, level: f64) -> Result<(), StoreError> {
        self.shared.commit("set_energy_level", |current| {
            let mut next = current.clone();
            next.energy.level = clamp_unit(level);
            Ok((Change::Commit(next), ()))
        })
    }

    /// Append a connection.
    ///
    /// Fails with [`StoreError::DuplicateConnection`] if the same
    /// `(from, to)` pair is already present.
    pub fn add_connection(&self, connection: Connection) -> Result<(), StoreError> {
        self.shared.commit("add_connection", |current| {
            if current.has_connection(&connection.from, &connection.to) {
                return Err(StoreError::DuplicateConnection {
                    from: connection.from.clone(),
                    to: connection.to.clone(),
                });
            }
            let mut next = current.clone();
            next.connections.push(connection);
            Ok((Change::Commit(next), ()))
        })
    }

    /// Remove every connection with exactly these endpoints.
    ///
    /// Returns how many were removed. Removing nothing is not an error and
    /// produces no snapshot.
    pub fn remove_connection(&self, from: &ScopeId, to: &ScopeId) -> Result<usize, StoreError> {
        self.shared.commit("remove_connection", |current| {
            let before = current.connections.len();
            let mut next = current.clone();
            next.connections.retain(|c| !c.matches(from, to));
            let removed = before.saturating_sub(next.connections.len());
            if removed == 0 {
                return Ok((Change::Unchanged, 0));
            }
            Ok((Change::Commit(next), removed))
        })
    }

    /// Insert a space, or replace the space with the same id.
    pub fn upsert_space(&self, space: FlowSpace) -> Result<(), StoreError> {
        self.shared.commit("upsert_space", |current| {
            let mut next = current.clone();
            let space = clamp_space(space);
            next.spaces.insert(space.id.clone(), space);
            Ok((Change::Commit(next), ()))
        })
    }

    /// Insert or replace several spaces in one snapshot.
    ///
    /// Spaces not named in the batch are kept. Fails with
    /// [`StoreError::DuplicateSpace`] if the batch names an id twice.
    pub fn commit_spaces(&self, spaces: Vec<FlowSpace>) -> Result<(), StoreError> {
        self.shared.commit("commit_spaces", |current| {
            Ok((Change::Commit(with_spaces(current, spaces)?), ()))
        })
    }

    /// Compute spaces from the current snapshot and commit them in one step.
    ///
    /// `f` runs under the publish lock, so no other commit can land between
    /// the snapshot it reads and the spaces it returns. It may read the
    /// store; mutating it from inside `f` fails with
    /// [`StoreError::ReentrantUpdate`]. The returned spaces are applied as in
    /// [`StateStore::commit_spaces`], and an empty batch produces no
    /// snapshot. If `f` fails, nothing is committed.
    ///
    /// Returns the output of `f` and the store version after the call.
    pub fn update_spaces<T, E, F>(&self, f: F) -> Result<(T, u64), E>
    where
        F: FnOnce(&ConsciousnessState) -> Result<(Vec<FlowSpace>, T), E>,
        E: From<StoreError>,
    {
        self.shared.commit_versioned("update_spaces", |current| {
            let (spaces, out) = f(current)?;
            if spaces.is_empty() {
                return Ok((Change::Unchanged, out));
            }
            Ok((Change::Commit(with_spaces(current, spaces)?), out))
        })
    }

    /// Remove a space. Returns whether it existed; absence produces no
    /// snapshot.
    pub fn remove_space(&self, id: &SpaceId) -> Result<bool, StoreError> {
        self.shared.commit("remove_space", |current| {
            if !current.spaces.contains_key(id) {
                return Ok((Change::Unchanged, false));
            }
            let mut next = current.clone();
            next.spaces.remove(id);
            Ok((Change::Commit(next), true))
        })
    }

    /// Grow the root depth by a non-negative amount, clamped at 1.
    pub fn deepen(&self, delta: f64) -> Result<(), StoreError> {
        if !delta.is_finite() || delta < 0.0 {
            return Err(StoreError::InvalidDepthDelta(delta));
        }
        self.shared.commit("deepen", |current| {
            let mut next = current.clone();
            next.depth = clamp_unit(current.depth + delta);
            Ok((Change::Commit(next), ()))
        })
    }

    /// Restore the session defaults. This is the only way depth goes down.
    pub fn reset(&self) -> Result<(), StoreError> {
        self.shared
            .commit("reset", |_| Ok((Change::Commit(ConsciousnessState::new_root()), ())))
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = lock(&self.shared.inner);
        f.debug_struct("StateStore")
            .field("version", &inner.version)
            .field("observers", &inner.observers.len())
            .finish_non_exhaustive()
    }
}

/// `current` with each of `spaces` inserted or replaced by id.
fn with_spaces(
    current: &ConsciousnessState,
    spaces: Vec<FlowSpace>,
) -> Result<ConsciousnessState, StoreError> {
    let mut next = current.clone();
    let mut seen = std::collections::BTreeSet::new();
    for space in spaces {
        if !seen.insert(space.id.clone()) {
            return Err(StoreError::DuplicateSpace(space.id));
        }
        let space = clamp_space(space);
        next.spaces.insert(space.id.clone(), space);
    }
    Ok(next)
}

/// Clamp every scalar in a space before it enters the snapshot.
fn clamp_space(mut space: FlowSpace) -> FlowSpace {
    space.flow = space.flow.clamped();
    space.energy = space.energy.clamped();
    space.members = space.members.into_iter().map(presence_types::Member::clamped).collect();
    space
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use presence_types::{Member, MemberState};

    use super::*;

    const EPS: f64 = 1e-9;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut(&Arc<ConsciousnessState>) + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, move |_: &Arc<ConsciousnessState>| {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn new_observer_receives_current_snapshot() {
        let store = StateStore::new();
        let (count, observer) = counter();
        let _sub = store.observe_state(observer);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn each_mutation_emits_once() {
        let store = StateStore::new();
        let (count, observer) = counter();
        let _sub = store.observe_state(observer);

        store.update_flow(&NaturalFlowPatch::default()).unwrap();
        store.update_energy(EnergyState::default()).unwrap();
        store.add_connection(Connection::new("a", "b")).unwrap();

        assert_eq!(count.load(Ordering::SeqCst), 4);
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn dropping_subscription_stops_delivery() {
        let store = StateStore::new();
        let (count, observer) = counter();
        let sub = store.observe_state(observer);
        drop(sub);
        assert_eq!(store.observer_count(), 0);
        store.deepen(0.1).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn duplicate_connection_is_rejected_without_emission() {
        let store = StateStore::new();
        store.add_connection(Connection::new("a", "b")).unwrap();
        let (count, observer) = counter();
        let _sub = store.observe_state(observer);

        let err = store.add_connection(Connection::new("a", "b")).unwrap_err();
        assert_eq!(
            err,
            StoreError::DuplicateConnection {
                from: ScopeId::new("a"),
                to: ScopeId::new("b"),
            }
        );
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.snapshot().connections.len(), 1);

        // The reverse direction is a different edge.
        store.add_connection(Connection::new("b", "a")).unwrap();
        assert_eq!(store.snapshot().connections.len(), 2);
    }

    #[test]
    fn remove_missing_connection_is_silent() {
        let store = StateStore::new();
        let removed = store
            .remove_connection(&ScopeId::new("x"), &ScopeId::new("y"))
            .unwrap();
        assert_eq!(removed, 0);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn deepen_is_monotonic_and_clamped() {
        let store = StateStore::new();
        store.deepen(0.7).unwrap();
        store.deepen(0.7).unwrap();
        assert!((store.snapshot().depth - 1.0).abs() < EPS);
        assert_eq!(store.deepen(-0.1), Err(StoreError::InvalidDepthDelta(-0.1)));
        assert!(store.deepen(f64::NAN).is_err());
        store.reset().unwrap();
        assert!(store.snapshot().depth.abs() < EPS);
    }

    #[test]
    fn upsert_space_clamps_members() {
        let store = StateStore::new();
        let mut member = Member::new("m1", MemberState::Calm);
        member.energy = 3.0;
        store
            .upsert_space(FlowSpace::new("hall", "Hall").with_members(vec![member]))
            .unwrap();
        let snapshot = store.snapshot();
        let space = snapshot.space(&SpaceId::new("hall")).unwrap();
        assert!((space.members[0].energy - 1.0).abs() < EPS);
    }

    #[test]
    fn commit_spaces_rejects_duplicates() {
        let store = StateStore::new();
        let err = store
            .commit_spaces(vec![FlowSpace::new("a", "A"), FlowSpace::new("a", "A again")])
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateSpace(SpaceId::new("a")));
        assert!(store.snapshot().spaces.is_empty());
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn remove_space_reports_presence() {
        let store = StateStore::new();
        store.upsert_space(FlowSpace::new("a", "A")).unwrap();
        assert!(store.remove_space(&SpaceId::new("a")).unwrap());
        assert!(!store.remove_space(&SpaceId::new("a")).unwrap());
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn update_spaces_reads_and_writes_in_one_commit() {
        let store = StateStore::new();
        store.upsert_space(FlowSpace::new("a", "A")).unwrap();

        let (count, version) = store
            .update_spaces(|state| {
                let renamed: Vec<FlowSpace> = state
                    .spaces
                    .values()
                    .map(|space| {
                        let mut next = space.clone();
                        next.name = "Renamed".to_owned();
                        next
                    })
                    .collect();
                let count = renamed.len();
                Ok::<_, StoreError>((renamed, count))
            })
            .unwrap();

        assert_eq!(count, 1);
        assert_eq!(version, 2);
        assert_eq!(store.snapshot().space(&SpaceId::new("a")).unwrap().name, "Renamed");
    }

    #[test]
    fn update_spaces_may_read_but_not_mutate_the_store() {
        let store = StateStore::new();
        store.upsert_space(FlowSpace::new("a", "A")).unwrap();
        let inner = store.clone();

        let (removal, _) = store
            .update_spaces(|state| {
                assert_eq!(inner.snapshot().spaces.len(), state.spaces.len());
                let removal = inner.remove_space(&SpaceId::new("a"));
                Ok::<_, StoreError>((state.spaces.values().cloned().collect(), removal))
            })
            .unwrap();

        assert_eq!(removal, Err(StoreError::ReentrantUpdate));
        assert!(store.snapshot().space(&SpaceId::new("a")).is_some());
    }

    #[test]
    fn update_spaces_error_or_empty_batch_commits_nothing() {
        let store = StateStore::new();

        let err = store
            .update_spaces(|_| Err::<(Vec<FlowSpace>, ()), _>(StoreError::InvalidDepthDelta(-1.0)))
            .unwrap_err();
        assert_eq!(err, StoreError::InvalidDepthDelta(-1.0));

        let ((), version) = store.update_spaces(|_| Ok::<_, StoreError>((Vec::new(), ()))).unwrap();
        assert_eq!(version, 0);
    }

    #[test]
    fn set_energy_level_keeps_other_fields() {
        let store = StateStore::new();
        store.update_energy(EnergyState::new(0.1, 0.9, 0.8, 0.7)).unwrap();
        store.set_energy_level(1.4).unwrap();

        let energy = store.snapshot().energy;
        assert!((energy.level - 1.0).abs() < EPS);
        assert!((energy.quality - 0.9).abs() < EPS);
        assert!((energy.stability - 0.8).abs() < EPS);
        assert!((energy.protection - 0.7).abs() < EPS);
    }
}
