//! Cluster objects as the dashboard sees them.
//!
//! These are flattened views over the Nomad API payloads; see
//! `core::client::mappers` for the conversions.

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::common::model::Topic;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub job_type: String,
    pub status: String,
    pub status_description: String,
    pub summary: JobSummary,
    pub submit_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub total: u64,
    pub running: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deployment {
    pub id: String,
    pub job_id: String,
    pub namespace: String,
    pub status: String,
    pub status_description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Allocation {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub task_group: String,
    pub tasks: Vec<AllocTask>,
    /// Task names in sorted order.
    pub task_names: Vec<String>,
    pub job_id: String,
    pub job_type: String,
    pub node_id: String,
    pub node_name: String,
    pub desired_status: String,
    pub version: u64,
    pub status: String,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
}

impl Allocation {
    pub fn has_tasks(&self) -> bool {
        !self.task_names.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocTask {
    pub name: String,
    pub state: String,
    pub events: Vec<TaskEvent>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskEvent {
    pub event_type: String,
    pub time: Option<DateTime<Utc>>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Namespace {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGroup {
    pub name: String,
    pub job_id: String,
    pub queued: u64,
    pub complete: u64,
    pub failed: u64,
    pub running: u64,
    pub starting: u64,
    pub lost: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGroupStatus {
    pub id: String,
    pub desired: u64,
    pub placed: u64,
    pub healthy: u64,
    pub unhealthy: u64,
    pub progress_deadline: Duration,
    pub status: String,
    pub status_description: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobStatus {
    pub id: String,
    pub name: String,
    pub namespace: String,
    pub job_type: String,
    pub status: String,
    pub status_description: String,
    pub submit_date: Option<DateTime<Utc>>,
    pub priority: i64,
    pub datacenters: String,
    pub periodic: bool,
    pub parameterized: bool,
    pub task_groups: Vec<TaskGroup>,
    pub task_group_status: Vec<TaskGroupStatus>,
    pub allocations: Vec<Allocation>,
}

/// One change notice from the event stream. Only the topic drives a refresh;
/// the rest is kept for tracing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEvent {
    pub topic: Topic,
    pub event_type: String,
    pub key: String,
    pub index: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBatch {
    pub index: u64,
    pub events: Vec<ClusterEvent>,
}

impl EventBatch {
    /// Distinct topics in first-seen order.
    pub fn topics(&self) -> Vec<Topic> {
        let mut topics = Vec::new();
        for event in &self.events {
            if !topics.contains(&event.topic) {
                topics.push(event.topic);
            }
        }
        topics
    }
}
