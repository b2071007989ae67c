use std::sync::Arc;

use async_trait::async_trait;

use crate::core::client::{NomadApi, SearchOptions};
use crate::core::state::runtime::cluster::cluster_state::ClusterState;
use crate::domain::cluster::TaskGroup;
use crate::domain::common::model::Topic;
use crate::errors::NomadError;
use crate::scheduler::poller::PollTask;
use crate::watcher::Watcher;

pub struct TaskGroupsTask {
    pub job_id: String,
}

#[async_trait]
impl PollTask for TaskGroupsTask {
    const TOPIC: Topic = Topic::TaskGroup;
    type Output = Vec<TaskGroup>;

    async fn fetch(
        &self,
        nomad: &dyn NomadApi,
        opts: &SearchOptions,
    ) -> Result<Vec<TaskGroup>, NomadError> {
        nomad.task_groups(&self.job_id, opts).await
    }

    fn store(&self, state: &mut ClusterState, value: Vec<TaskGroup>) {
        state.set_task_groups(value);
    }
}

impl<N: NomadApi> Watcher<N> {
    /// Show the task groups of `job_id` and poll them until the next view
    /// switch.
    pub async fn subscribe_to_task_groups<F>(&self, job_id: &str, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let task = TaskGroupsTask {
            job_id: job_id.to_string(),
        };
        self.start_polling(task, Arc::new(callback)).await;
    }
}
