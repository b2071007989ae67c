/// Maps Nomad API wire types → internal domain models
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::core::client::nomad_resources::{
    AllocationListStub, DeploymentResponse, EventResponse, EventsResponse, JobListStub,
    JobResponse, JobSummaryResponse, NamespaceResponse,
};
use crate::domain::cluster::{
    AllocTask, Allocation, ClusterEvent, Deployment, EventBatch, Job, JobStatus, JobSummary,
    Namespace, TaskEvent, TaskGroup, TaskGroupStatus,
};
use crate::domain::common::model::Topic;

/// Nomad timestamps are Unix nanoseconds; zero means "not set".
fn from_unix_nanos(nanos: i64) -> Option<DateTime<Utc>> {
    (nanos > 0).then(|| DateTime::from_timestamp_nanos(nanos))
}

pub fn map_job(stub: JobListStub) -> Job {
    let summary = stub
        .job_summary
        .as_ref()
        .map(|s| {
            s.summary.values().fold(JobSummary::default(), |acc, tg| JobSummary {
                total: acc.total
                    + tg.queued
                    + tg.complete
                    + tg.failed
                    + tg.running
                    + tg.starting
                    + tg.lost,
                running: acc.running + tg.running,
            })
        })
        .unwrap_or_default();

    // The stub's own namespace is empty on some older servers; the summary
    // always carries it.
    let namespace = match stub.job_summary {
        Some(s) if stub.namespace.is_empty() => s.namespace,
        _ => stub.namespace,
    };

    Job {
        id: stub.id,
        name: stub.name,
        namespace,
        job_type: stub.job_type,
        status: stub.status,
        status_description: stub.status_description,
        summary,
        submit_time: from_unix_nanos(stub.submit_time),
    }
}

pub fn map_namespace(ns: NamespaceResponse) -> Namespace {
    Namespace {
        name: ns.name,
        description: ns.description,
    }
}

pub fn map_deployment(d: DeploymentResponse) -> Deployment {
    Deployment {
        id: d.id,
        job_id: d.job_id,
        namespace: d.namespace,
        status: d.status,
        status_description: d.status_description,
    }
}

/// Task groups of a job summary, sorted by name.
pub fn map_task_groups(summary: JobSummaryResponse) -> Vec<TaskGroup> {
    summary
        .summary
        .into_iter()
        .map(|(name, tg)| TaskGroup {
            name,
            job_id: summary.job_id.clone(),
            queued: tg.queued,
            complete: tg.complete,
            failed: tg.failed,
            running: tg.running,
            starting: tg.starting,
            lost: tg.lost,
        })
        .collect()
}

pub fn map_allocation(stub: AllocationListStub) -> Allocation {
    let task_names: Vec<String> = stub.task_states.keys().cloned().collect();
    let tasks = stub
        .task_states
        .into_iter()
        .map(|(name, state)| AllocTask {
            name,
            state: state.state,
            events: state
                .events
                .into_iter()
                .map(|e| TaskEvent {
                    event_type: e.event_type,
                    time: from_unix_nanos(e.time),
                    message: e.display_message,
                })
                .collect(),
        })
        .collect();

    Allocation {
        id: stub.id,
        name: stub.name,
        namespace: stub.namespace,
        task_group: stub.task_group,
        tasks,
        task_names,
        job_id: stub.job_id,
        job_type: stub.job_type,
        node_id: stub.node_id,
        node_name: stub.node_name,
        desired_status: stub.desired_status,
        version: stub.job_version,
        status: stub.client_status,
        created: from_unix_nanos(stub.create_time),
        modified: from_unix_nanos(stub.modify_time),
    }
}

/// Per task group rollout state of the job's latest deployment.
///
/// Deployments arrive newest first, so only the first match counts.
pub fn map_task_group_status(job_id: &str, deployments: &[DeploymentResponse]) -> Vec<TaskGroupStatus> {
    deployments
        .iter()
        .find(|d| d.job_id == job_id)
        .map(|d| {
            d.task_groups
                .values()
                .map(|tg| TaskGroupStatus {
                    id: d.job_id.clone(),
                    desired: tg.desired_total,
                    placed: tg.placed_allocs,
                    healthy: tg.healthy_allocs,
                    unhealthy: tg.unhealthy_allocs,
                    progress_deadline: Duration::from_nanos(tg.progress_deadline.max(0) as u64),
                    status: d.status.clone(),
                    status_description: d.status_description.clone(),
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn map_job_status(
    job: JobResponse,
    task_groups: Vec<TaskGroup>,
    task_group_status: Vec<TaskGroupStatus>,
    allocations: Vec<Allocation>,
) -> JobStatus {
    JobStatus {
        id: job.id,
        name: job.name,
        namespace: job.namespace,
        job_type: job.job_type,
        status: job.status,
        status_description: job.status_description,
        submit_date: from_unix_nanos(job.submit_time),
        priority: job.priority,
        datacenters: job.datacenters.join(", "),
        periodic: job.periodic.is_some(),
        parameterized: job.parameterized_job.is_some(),
        task_groups,
        task_group_status,
        allocations,
    }
}

fn map_event(event: EventResponse) -> Option<ClusterEvent> {
    let topic = event.topic.parse::<Topic>().ok()?;
    Some(ClusterEvent {
        topic,
        event_type: event.event_type,
        key: event.key,
        index: event.index,
    })
}

/// Drops events on topics the dashboard does not track. Returns `None` for
/// heartbeats and batches with nothing left.
pub fn map_event_batch(resp: EventsResponse) -> Option<EventBatch> {
    let events: Vec<ClusterEvent> = resp.events.into_iter().filter_map(map_event).collect();
    if events.is_empty() {
        return None;
    }

    Some(EventBatch {
        index: resp.index,
        events,
    })
}
