use tracing::debug;

use crate::core::client::mappers::map_task_groups;
use crate::core::client::nomad_client::{encode_id, NomadHttpClient};
use crate::core::client::nomad_resources::JobSummaryResponse;
use crate::core::client::search_options::SearchOptions;
use crate::domain::cluster::TaskGroup;
use crate::errors::NomadError;

/// Fetch the task groups of a job from its summary
pub async fn fetch_task_groups(
    client: &NomadHttpClient,
    job_id: &str,
    opts: &SearchOptions,
) -> Result<Vec<TaskGroup>, NomadError> {
    let path = format!("/v1/job/{}/summary", encode_id(job_id));
    let summary: JobSummaryResponse = client.get_json(&path, &opts.item_query()).await?;

    let task_groups = map_task_groups(summary);
    debug!("Fetched {} task group(s) for job {}", task_groups.len(), job_id);
    Ok(task_groups)
}
