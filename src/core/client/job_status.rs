use tracing::debug;

use crate::core::client::allocations::fetch_job_allocations;
use crate::core::client::deployments::fetch_job_deployments;
use crate::core::client::mappers::{map_job_status, map_task_group_status};
use crate::core::client::nomad_client::{encode_id, NomadHttpClient};
use crate::core::client::nomad_resources::JobResponse;
use crate::core::client::search_options::SearchOptions;
use crate::core::client::task_groups::fetch_task_groups;
use crate::domain::cluster::JobStatus;
use crate::errors::NomadError;

/// Compose the detail view of one job.
///
/// Task groups and allocations are best effort and fall back to empty lists.
/// Failures reading the job itself or its deployments are returned.
pub async fn fetch_job_status(
    client: &NomadHttpClient,
    job_id: &str,
    opts: &SearchOptions,
) -> Result<JobStatus, NomadError> {
    let task_groups = fetch_task_groups(client, job_id, opts)
        .await
        .unwrap_or_else(|e| {
            debug!("Task groups for job {} unavailable: {}", job_id, e);
            Vec::new()
        });

    let allocations = fetch_job_allocations(client, job_id, opts)
        .await
        .unwrap_or_else(|e| {
            debug!("Allocations for job {} unavailable: {}", job_id, e);
            Vec::new()
        });

    let path = format!("/v1/job/{}", encode_id(job_id));
    let job: JobResponse = client.get_json(&path, &opts.item_query()).await?;

    let deployments = fetch_job_deployments(client, job_id, opts).await?;
    let task_group_status = map_task_group_status(job_id, &deployments);

    debug!("Fetched status for job {}", job_id);
    Ok(map_job_status(job, task_groups, task_group_status, allocations))
}
