use tracing::debug;

use crate::core::client::mappers::map_namespace;
use crate::core::client::nomad_client::NomadHttpClient;
use crate::core::client::nomad_resources::NamespaceResponse;
use crate::core::client::search_options::SearchOptions;
use crate::domain::cluster::Namespace;
use crate::errors::NomadError;

/// Fetch all namespaces in the region
pub async fn fetch_namespaces(
    client: &NomadHttpClient,
    opts: &SearchOptions,
) -> Result<Vec<Namespace>, NomadError> {
    let namespaces: Vec<NamespaceResponse> = client
        .get_json("/v1/namespaces", &opts.region_query())
        .await?;

    debug!("Discovered {} namespace(s)", namespaces.len());
    Ok(namespaces.into_iter().map(map_namespace).collect())
}
