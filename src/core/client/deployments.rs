use tracing::debug;

use crate::core::client::mappers::map_deployment;
use crate::core::client::nomad_client::{encode_id, NomadHttpClient};
use crate::core::client::nomad_resources::DeploymentResponse;
use crate::core::client::search_options::SearchOptions;
use crate::domain::cluster::Deployment;
use crate::errors::NomadError;

/// Fetch all deployments visible under `opts`
pub async fn fetch_deployments(
    client: &NomadHttpClient,
    opts: &SearchOptions,
) -> Result<Vec<Deployment>, NomadError> {
    let deployments: Vec<DeploymentResponse> = client
        .get_json("/v1/deployments", &opts.list_query())
        .await?;

    debug!("Discovered {} deployment(s)", deployments.len());
    Ok(deployments.into_iter().map(map_deployment).collect())
}

/// Fetch the raw deployments of one job, newest first
pub async fn fetch_job_deployments(
    client: &NomadHttpClient,
    job_id: &str,
    opts: &SearchOptions,
) -> Result<Vec<DeploymentResponse>, NomadError> {
    let path = format!("/v1/job/{}/deployments", encode_id(job_id));
    let deployments: Vec<DeploymentResponse> = client.get_json(&path, &opts.item_query()).await?;

    debug!("Fetched {} deployment(s) for job {}", deployments.len(), job_id);
    Ok(deployments)
}
