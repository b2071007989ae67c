use std::sync::Arc;

use async_trait::async_trait;

use crate::core::client::{NomadApi, SearchOptions};
use crate::core::state::runtime::cluster::cluster_state::ClusterState;
use crate::domain::cluster::Namespace;
use crate::domain::common::model::Topic;
use crate::errors::NomadError;
use crate::scheduler::poller::PollTask;
use crate::watcher::Watcher;

pub struct NamespacesTask;

#[async_trait]
impl PollTask for NamespacesTask {
    const TOPIC: Topic = Topic::Namespace;
    type Output = Vec<Namespace>;

    async fn fetch(
        &self,
        nomad: &dyn NomadApi,
        opts: &SearchOptions,
    ) -> Result<Vec<Namespace>, NomadError> {
        nomad.namespaces(opts).await
    }

    fn store(&self, state: &mut ClusterState, value: Vec<Namespace>) {
        state.set_namespaces(value);
    }
}

impl<N: NomadApi> Watcher<N> {
    /// Show the namespace list and poll it until the next view switch.
    pub async fn subscribe_to_namespaces<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.start_polling(NamespacesTask, Arc::new(callback)).await;
    }
}
