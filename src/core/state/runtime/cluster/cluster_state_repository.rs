use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::state::runtime::cluster::cluster_state::ClusterState;

/// Holds the shared `ClusterState` snapshot.
///
/// Readers get a cheap `Arc` clone. Writers mutate in place when no reader
/// holds the current snapshot, and clone it otherwise.
#[derive(Debug, Default)]
pub struct ClusterStateRepository {
    state: RwLock<Arc<ClusterState>>,
}

impl ClusterStateRepository {
    pub fn new(state: ClusterState) -> Self {
        Self {
            state: RwLock::new(Arc::new(state)),
        }
    }

    /// Return the current snapshot (zero copy).
    pub fn get(&self) -> Arc<ClusterState> {
        self.state.read().clone()
    }

    /// Mutate the state through a closure; the write lock is held for the
    /// duration of `f`.
    pub fn update<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut ClusterState) -> R,
    {
        let mut guard = self.state.write();
        f(Arc::make_mut(&mut guard))
    }
}
