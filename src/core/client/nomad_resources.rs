//! Wire types for the Nomad HTTP API.
//!
//! Only the fields the dashboard reads are modelled. Nomad sends `null` for
//! empty collections, which `DefaultOnNull` folds into empty values.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_with::{serde_as, DefaultOnNull};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JobListStub {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(rename = "Type")]
    pub job_type: String,
    pub status: String,
    pub status_description: String,
    pub submit_time: i64,
    pub job_summary: Option<JobSummaryResponse>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JobSummaryResponse {
    #[serde(rename = "JobID")]
    pub job_id: String,
    pub namespace: String,
    #[serde_as(as = "DefaultOnNull")]
    pub summary: BTreeMap<String, TaskGroupSummary>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskGroupSummary {
    pub queued: u64,
    pub complete: u64,
    pub failed: u64,
    pub running: u64,
    pub starting: u64,
    pub lost: u64,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct JobResponse {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(rename = "Type")]
    pub job_type: String,
    pub priority: i64,
    pub status: String,
    pub status_description: String,
    pub submit_time: i64,
    #[serde_as(as = "DefaultOnNull")]
    pub datacenters: Vec<String>,
    pub periodic: Option<serde_json::Value>,
    pub parameterized_job: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct NamespaceResponse {
    pub name: String,
    pub description: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DeploymentResponse {
    #[serde(rename = "ID")]
    pub id: String,
    pub namespace: String,
    #[serde(rename = "JobID")]
    pub job_id: String,
    pub status: String,
    pub status_description: String,
    #[serde_as(as = "DefaultOnNull")]
    pub task_groups: BTreeMap<String, DeploymentTaskGroupState>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DeploymentTaskGroupState {
    pub desired_total: u64,
    pub placed_allocs: u64,
    pub healthy_allocs: u64,
    pub unhealthy_allocs: u64,
    /// Nanoseconds.
    pub progress_deadline: i64,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AllocationListStub {
    #[serde(rename = "ID")]
    pub id: String,
    pub name: String,
    pub namespace: String,
    #[serde(rename = "NodeID")]
    pub node_id: String,
    pub node_name: String,
    #[serde(rename = "JobID")]
    pub job_id: String,
    pub job_type: String,
    pub job_version: u64,
    pub task_group: String,
    pub desired_status: String,
    pub client_status: String,
    #[serde_as(as = "DefaultOnNull")]
    pub task_states: BTreeMap<String, TaskStateResponse>,
    pub create_time: i64,
    pub modify_time: i64,
}

#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskStateResponse {
    pub state: String,
    #[serde_as(as = "DefaultOnNull")]
    pub events: Vec<TaskEventResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TaskEventResponse {
    #[serde(rename = "Type")]
    pub event_type: String,
    pub time: i64,
    pub display_message: String,
}

/// One line of `/v1/event/stream`. Heartbeats arrive as `{}`.
#[serde_as]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EventsResponse {
    pub index: u64,
    #[serde_as(as = "DefaultOnNull")]
    pub events: Vec<EventResponse>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EventResponse {
    pub topic: String,
    #[serde(rename = "Type")]
    pub event_type: String,
    pub key: String,
    pub index: u64,
}
