use tracing::debug;

use crate::core::client::mappers::map_allocation;
use crate::core::client::nomad_client::{encode_id, NomadHttpClient};
use crate::core::client::nomad_resources::AllocationListStub;
use crate::core::client::search_options::SearchOptions;
use crate::domain::cluster::Allocation;
use crate::errors::NomadError;

/// Fetch all allocations visible under `opts`
pub async fn fetch_allocations(
    client: &NomadHttpClient,
    opts: &SearchOptions,
) -> Result<Vec<Allocation>, NomadError> {
    let stubs: Vec<AllocationListStub> = client
        .get_json("/v1/allocations", &opts.list_query())
        .await?;

    debug!("Discovered {} allocation(s)", stubs.len());
    Ok(stubs.into_iter().map(map_allocation).collect())
}

/// Fetch the allocations of a single job
pub async fn fetch_job_allocations(
    client: &NomadHttpClient,
    job_id: &str,
    opts: &SearchOptions,
) -> Result<Vec<Allocation>, NomadError> {
    let path = format!("/v1/job/{}/allocations", encode_id(job_id));
    let stubs: Vec<AllocationListStub> = client.get_json(&path, &opts.item_query()).await?;

    debug!("Found {} allocation(s) for job {}", stubs.len(), job_id);
    Ok(stubs.into_iter().map(map_allocation).collect())
}
