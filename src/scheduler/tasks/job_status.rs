use std::sync::Arc;

use async_trait::async_trait;

use crate::core::client::{NomadApi, SearchOptions};
use crate::core::state::runtime::cluster::cluster_state::ClusterState;
use crate::domain::cluster::JobStatus;
use crate::domain::common::model::Topic;
use crate::errors::NomadError;
use crate::scheduler::poller::PollTask;
use crate::watcher::Watcher;

pub struct JobStatusTask {
    pub job_id: String,
}

#[async_trait]
impl PollTask for JobStatusTask {
    const TOPIC: Topic = Topic::JobStatus;
    type Output = JobStatus;

    async fn fetch(&self, nomad: &dyn NomadApi, opts: &SearchOptions) -> Result<JobStatus, NomadError> {
        nomad.job_status(&self.job_id, opts).await
    }

    fn store(&self, state: &mut ClusterState, value: JobStatus) {
        state.set_job_status(value);
    }
}

impl<N: NomadApi> Watcher<N> {
    /// Show the detail view of `job_id` and poll it until the next view
    /// switch.
    pub async fn subscribe_to_job_status<F>(&self, job_id: &str, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let task = JobStatusTask {
            job_id: job_id.to_string(),
        };
        self.start_polling(task, Arc::new(callback)).await;
    }
}
