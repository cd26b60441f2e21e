//! Flow lookup by scope id.

use presence_types::{NaturalFlow, ScopeId, SpaceId};

use crate::store::StateStore;

/// Resolves the [`NaturalFlow`] that belongs to a scope.
pub trait FlowResolver {
    /// The flow of the scope with this id, or `None` if no such scope exists.
    fn find_flow(&self, id: &ScopeId) -> Option<NaturalFlow>;
}

/// Resolves flows against the current snapshot of a [`StateStore`].
///
/// The root id resolves to the root flow; any other id is looked up as a
/// space id.
#[derive(Debug, Clone)]
pub struct StoreFlowResolver {
    store: StateStore,
}

impl StoreFlowResolver {
    /// Resolve against this store.
    pub const fn new(store: StateStore) -> Self {
        Self { store }
    }
}

impl FlowResolver for StoreFlowResolver {
    fn find_flow(&self, id: &ScopeId) -> Option<NaturalFlow> {
        let snapshot = self.store.snapshot();
        if *id == snapshot.id {
            return Some(snapshot.flow);
        }
        snapshot
            .space(&SpaceId::new(id.as_str()))
            .map(|space| space.flow)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use presence_types::{FlowSpace, NaturalFlowPatch};

    use super::*;

    #[test]
    fn resolves_root_and_spaces() {
        let store = StateStore::new();
        store
            .update_flow(&NaturalFlowPatch {
                presence: Some(0.8),
                ..NaturalFlowPatch::default()
            })
            .unwrap();
        let mut hall = FlowSpace::new("hall", "Hall");
        hall.flow = NaturalFlow::uniform(0.2);
        store.upsert_space(hall).unwrap();

        let resolver = StoreFlowResolver::new(store);
        let root = resolver.find_flow(&ScopeId::root()).unwrap();
        assert!((root.presence - 0.8).abs() < 1e-9);

        let hall = resolver.find_flow(&ScopeId::new("hall")).unwrap();
        assert!((hall.rhythm - 0.2).abs() < 1e-9);

        assert!(resolver.find_flow(&ScopeId::new("nowhere")).is_none());
    }
}
