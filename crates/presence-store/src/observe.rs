//! Observer plumbing: the callback trait and the distinct-until-changed
//! projection wrapper used for derived views.

use std::sync::Arc;

use presence_types::ConsciousnessState;

/// Receives every snapshot the store publishes, in commit order.
///
/// Implemented for any `FnMut(&Arc<ConsciousnessState>) + Send` closure.
pub trait StateObserver: Send {
    /// Called once on registration with the current snapshot, then once per
    /// subsequent commit.
    fn on_state(&mut self, state: &Arc<ConsciousnessState>);
}

impl<F> StateObserver for F
where
    F: FnMut(&Arc<ConsciousnessState>) + Send,
{
    fn on_state(&mut self, state: &Arc<ConsciousnessState>) {
        self(state);
    }
}

/// Projects each snapshot to a value and forwards it only when it differs
/// from the last forwarded value.
///
/// The first projection is always forwarded.
pub struct Distinct<T, P, S> {
    project: P,
    sink: S,
    last: Option<T>,
}

impl<T, P, S> Distinct<T, P, S>
where
    T: PartialEq + Send,
    P: FnMut(&ConsciousnessState) -> T + Send,
    S: FnMut(&T) + Send,
{
    /// Wrap a projection and the sink that receives changed values.
    pub const fn new(project: P, sink: S) -> Self {
        Self {
            project,
            sink,
            last: None,
        }
    }
}

impl<T, P, S> StateObserver for Distinct<T, P, S>
where
    T: PartialEq + Send,
    P: FnMut(&ConsciousnessState) -> T + Send,
    S: FnMut(&T) + Send,
{
    fn on_state(&mut self, state: &Arc<ConsciousnessState>) {
        let next = (self.project)(&**state);
        if self.last.as_ref() == Some(&next) {
            return;
        }
        (self.sink)(&next);
        self.last = Some(next);
    }
}
