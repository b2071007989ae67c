use tracing::debug;

use crate::core::client::mappers::map_job;
use crate::core::client::nomad_client::NomadHttpClient;
use crate::core::client::nomad_resources::JobListStub;
use crate::core::client::search_options::SearchOptions;
use crate::domain::cluster::Job;
use crate::errors::NomadError;

/// Fetch all jobs visible under `opts`
pub async fn fetch_jobs(
    client: &NomadHttpClient,
    opts: &SearchOptions,
) -> Result<Vec<Job>, NomadError> {
    let stubs: Vec<JobListStub> = client.get_json("/v1/jobs", &opts.list_query()).await?;

    debug!("Discovered {} job(s)", stubs.len());
    Ok(stubs.into_iter().map(map_job).collect())
}
