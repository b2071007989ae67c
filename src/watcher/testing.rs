//! Scripted `NomadApi` for watcher and scheduler tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::client::{EventReceiver, LogChannels, LogRequest, NomadApi, SearchOptions};
use crate::domain::cluster::{
    Allocation, Deployment, EventBatch, Job, JobStatus, Namespace, TaskGroup,
};
use crate::domain::common::model::Topic;
use crate::errors::NomadError;

type Responses<T> = Mutex<VecDeque<Result<T, NomadError>>>;
type EventSender = mpsc::Sender<Result<EventBatch, NomadError>>;

/// Responses are consumed in order; the last one repeats. An empty queue
/// answers with an empty value.
#[derive(Default)]
pub(crate) struct FakeNomad {
    jobs: Responses<Vec<Job>>,
    deployments: Responses<Vec<Deployment>>,
    allocations: Responses<Vec<Allocation>>,
    namespaces: Responses<Vec<Namespace>>,
    task_groups: Responses<Vec<TaskGroup>>,
    job_status: Responses<JobStatus>,
    namespaces_delay: Mutex<Option<Duration>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    job_ids: Mutex<Vec<String>>,
    log_requests: Mutex<Vec<LogRequest>>,
    log_senders: Mutex<Vec<(mpsc::Sender<Bytes>, mpsc::Sender<NomadError>)>>,
    stream_error: Mutex<Option<NomadError>>,
    stream_index: Mutex<Option<u64>>,
    event_tx: Mutex<Option<EventSender>>,
}

fn next<T: Clone + Default>(queue: &Responses<T>) -> Result<T, NomadError> {
    let mut queue = queue.lock();
    if queue.len() > 1 {
        return queue.pop_front().unwrap_or_else(|| Ok(T::default()));
    }
    queue.front().cloned().unwrap_or_else(|| Ok(T::default()))
}

impl FakeNomad {
    pub fn push_jobs(&self, response: Result<Vec<Job>, NomadError>) {
        self.jobs.lock().push_back(response);
    }

    pub fn push_deployments(&self, response: Result<Vec<Deployment>, NomadError>) {
        self.deployments.lock().push_back(response);
    }

    pub fn push_namespaces(&self, response: Result<Vec<Namespace>, NomadError>) {
        self.namespaces.lock().push_back(response);
    }

    pub fn push_task_groups(&self, response: Result<Vec<TaskGroup>, NomadError>) {
        self.task_groups.lock().push_back(response);
    }

    pub fn push_job_status(&self, response: Result<JobStatus, NomadError>) {
        self.job_status.lock().push_back(response);
    }

    /// Make every namespaces fetch take `delay` before answering.
    pub fn delay_namespaces(&self, delay: Duration) {
        *self.namespaces_delay.lock() = Some(delay);
    }

    pub fn fail_stream(&self, err: NomadError) {
        *self.stream_error.lock() = Some(err);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().get(method).copied().unwrap_or(0)
    }

    /// Job IDs passed to job-scoped calls, in call order.
    pub fn job_ids(&self) -> Vec<String> {
        self.job_ids.lock().clone()
    }

    pub fn log_requests(&self) -> Vec<LogRequest> {
        self.log_requests.lock().clone()
    }

    /// Producer ends of the `n`th log tail.
    pub fn log_senders(&self, n: usize) -> (mpsc::Sender<Bytes>, mpsc::Sender<NomadError>) {
        self.log_senders.lock()[n].clone()
    }

    pub fn stream_index(&self) -> Option<u64> {
        *self.stream_index.lock()
    }

    /// Wait until the event stream is opened and take its sender. Dropping
    /// the sender closes the stream.
    pub async fn wait_for_stream(&self) -> EventSender {
        for _ in 0..10_000 {
            if let Some(tx) = self.event_tx.lock().take() {
                return tx;
            }
            tokio::task::yield_now().await;
        }
        panic!("event stream was never opened");
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().entry(method).or_default() += 1;
    }

    fn record_job(&self, method: &'static str, job_id: &str) {
        self.record(method);
        self.job_ids.lock().push(job_id.to_string());
    }
}

#[async_trait]
impl NomadApi for FakeNomad {
    fn address(&self) -> &str {
        "http://nomad.test:4646"
    }

    async fn jobs(&self, _opts: &SearchOptions) -> Result<Vec<Job>, NomadError> {
        self.record("jobs");
        next(&self.jobs)
    }

    async fn namespaces(&self, _opts: &SearchOptions) -> Result<Vec<Namespace>, NomadError> {
        self.record("namespaces");
        let delay = *self.namespaces_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        next(&self.namespaces)
    }

    async fn deployments(&self, _opts: &SearchOptions) -> Result<Vec<Deployment>, NomadError> {
        self.record("deployments");
        next(&self.deployments)
    }

    async fn task_groups(
        &self,
        job_id: &str,
        _opts: &SearchOptions,
    ) -> Result<Vec<TaskGroup>, NomadError> {
        self.record_job("task_groups", job_id);
        next(&self.task_groups)
    }

    async fn allocations(&self, _opts: &SearchOptions) -> Result<Vec<Allocation>, NomadError> {
        self.record("allocations");
        next(&self.allocations)
    }

    async fn job_allocations(
        &self,
        job_id: &str,
        _opts: &SearchOptions,
    ) -> Result<Vec<Allocation>, NomadError> {
        self.record_job("job_allocations", job_id);
        next(&self.allocations)
    }

    async fn job_status(
        &self,
        job_id: &str,
        _opts: &SearchOptions,
    ) -> Result<JobStatus, NomadError> {
        self.record_job("job_status", job_id);
        next(&self.job_status)
    }

    fn logs(&self, request: LogRequest, _cancel: CancellationToken) -> LogChannels {
        self.record("logs");
        self.log_requests.lock().push(request);
        let (frames, errors, channels) = LogChannels::pair();
        self.log_senders.lock().push((frames, errors));
        channels
    }

    async fn stream(&self, _topics: &[Topic], index: u64) -> Result<EventReceiver, NomadError> {
        self.record("stream");
        *self.stream_index.lock() = Some(index);
        if let Some(err) = self.stream_error.lock().take() {
            return Err(err);
        }
        let (tx, rx) = mpsc::channel(16);
        *self.event_tx.lock() = Some(tx);
        Ok(rx)
    }
}

/// A callback that counts its invocations.
pub(crate) fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let hits = Arc::new(AtomicUsize::new(0));
    let inner = hits.clone();
    (hits, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

/// A handler that records every message it receives.
pub(crate) fn messages() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) + Send + Sync + 'static) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |msg: &str| sink.lock().push(msg.to_string()))
}

/// Yield to spawned tasks until `cond` holds.
pub(crate) async fn wait_until<F: Fn() -> bool>(cond: F) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
