use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::client::events::EventReceiver;
use crate::core::client::logs::{LogChannels, LogRequest};
use crate::core::client::search_options::SearchOptions;
use crate::domain::cluster::{Allocation, Deployment, Job, JobStatus, Namespace, TaskGroup};
use crate::domain::common::model::Topic;
use crate::errors::NomadError;

/// The remote cluster as seen by the watcher.
///
/// `NomadHttpClient` is the production implementation. Tests substitute a
/// scripted fake.
#[async_trait]
pub trait NomadApi: Send + Sync + 'static {
    fn address(&self) -> &str;

    async fn jobs(&self, opts: &SearchOptions) -> Result<Vec<Job>, NomadError>;

    async fn namespaces(&self, opts: &SearchOptions) -> Result<Vec<Namespace>, NomadError>;

    async fn deployments(&self, opts: &SearchOptions) -> Result<Vec<Deployment>, NomadError>;

    async fn task_groups(
        &self,
        job_id: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<TaskGroup>, NomadError>;

    async fn allocations(&self, opts: &SearchOptions) -> Result<Vec<Allocation>, NomadError>;

    async fn job_allocations(
        &self,
        job_id: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<Allocation>, NomadError>;

    async fn job_status(&self, job_id: &str, opts: &SearchOptions)
        -> Result<JobStatus, NomadError>;

    /// Start tailing a task's output. Frames and errors arrive on the returned
    /// channels until `cancel` fires or the remote side closes.
    ///
    /// Must be called from within a Tokio runtime.
    fn logs(&self, request: LogRequest, cancel: CancellationToken) -> LogChannels;

    /// Open the server event stream for `topics`, starting at `index`.
    async fn stream(&self, topics: &[Topic], index: u64) -> Result<EventReceiver, NomadError>;
}
