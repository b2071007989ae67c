use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::core::state::runtime::cluster::log_buffer::LogBuffer;
use crate::domain::cluster::{Allocation, Deployment, Job, JobStatus, Namespace, TaskGroup};
use crate::domain::common::model::Topic;

/// In-memory snapshot of everything the dashboard has synchronized.
///
/// This state:
/// - lives only in memory (NOT persisted)
/// - has one slot per object kind, overwritten in place by its sync task
/// - is written by at most one active task per slot at a time
#[derive(Debug, Clone, Default)]
pub struct ClusterState {
    // ===== Timestamps =====
    pub last_updated_at: HashMap<Topic, DateTime<Utc>>,
    pub last_error_at: Option<DateTime<Utc>>,

    // ===== Streamed slots =====
    pub jobs: Vec<Job>,
    pub deployments: Vec<Deployment>,
    pub allocations: Vec<Allocation>,

    // ===== Polled slots =====
    pub namespaces: Vec<Namespace>,
    pub task_groups: Vec<TaskGroup>,
    pub job_status: Option<JobStatus>,

    // ===== Log tail =====
    pub logs: LogBuffer,

    pub last_error_message: Option<String>,
}

impl ClusterState {
    pub fn new(max_log_lines: usize, max_log_bytes: usize) -> Self {
        Self {
            logs: LogBuffer::new(max_log_lines, max_log_bytes),
            ..Self::default()
        }
    }

    pub fn set_jobs(&mut self, jobs: Vec<Job>) {
        self.jobs = jobs;
        self.touch(Topic::Job);
    }

    pub fn set_deployments(&mut self, deployments: Vec<Deployment>) {
        self.deployments = deployments;
        self.touch(Topic::Deployment);
    }

    pub fn set_allocations(&mut self, allocations: Vec<Allocation>) {
        self.allocations = allocations;
        self.touch(Topic::Allocation);
    }

    pub fn set_namespaces(&mut self, namespaces: Vec<Namespace>) {
        self.namespaces = namespaces;
        self.touch(Topic::Namespace);
    }

    pub fn set_task_groups(&mut self, task_groups: Vec<TaskGroup>) {
        self.task_groups = task_groups;
        self.touch(Topic::TaskGroup);
    }

    pub fn set_job_status(&mut self, job_status: JobStatus) {
        self.job_status = Some(job_status);
        self.touch(Topic::JobStatus);
    }

    /// Look up an allocation by its full ID.
    pub fn allocation(&self, id: &str) -> Option<&Allocation> {
        self.allocations.iter().find(|a| a.id == id)
    }

    /// Record a sync failure without touching any slot.
    pub fn mark_error(&mut self, msg: String) {
        self.last_error_message = Some(msg);
        self.last_error_at = Some(Utc::now());
    }

    fn touch(&mut self, topic: Topic) {
        self.last_updated_at.insert(topic, Utc::now());
    }
}
