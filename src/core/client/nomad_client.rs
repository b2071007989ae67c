use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::NomadConfig;
use crate::core::client::events::{open_event_stream, EventReceiver};
use crate::core::client::logs::{spawn_log_pump, LogChannels, LogRequest};
use crate::core::client::nomad_api_trait::NomadApi;
use crate::core::client::search_options::SearchOptions;
use crate::core::client::{allocations, deployments, job_status, jobs, namespaces, task_groups};
use crate::domain::cluster::{Allocation, Deployment, Job, JobStatus, Namespace, TaskGroup};
use crate::domain::common::model::Topic;
use crate::errors::NomadError;

const TOKEN_HEADER: &str = "X-Nomad-Token";

/// Thin reqwest wrapper around the Nomad HTTP API.
#[derive(Debug, Clone)]
pub struct NomadHttpClient {
    http: Client,
    address: String,
    token: Option<String>,
    log_offset: u64,
}

/// Creates a Nomad client for the configured server address
pub fn build_nomad_client(config: &NomadConfig) -> Result<NomadHttpClient> {
    let address = config.address.trim_end_matches('/').to_string();
    Url::parse(&address).with_context(|| format!("invalid Nomad address: {}", config.address))?;

    // No request timeout: the event stream and log tails are long-lived.
    let http = Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    debug!("Nomad client initialized for {}", address);
    Ok(NomadHttpClient {
        http,
        address,
        token: config.token.clone().filter(|t| !t.is_empty()),
        log_offset: config.log_offset,
    })
}

impl NomadHttpClient {
    pub fn log_offset(&self) -> u64 {
        self.log_offset
    }

    /// Issue a GET and reject non-2xx responses.
    pub async fn request(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Response, NomadError> {
        let resp = self
            .build_request(path, query)
            .send()
            .await
            .map_err(|e| NomadError::transport(path, e))?;
        check_status(path, resp).await
    }

    fn build_request(&self, path: &str, query: &[(&str, String)]) -> RequestBuilder {
        let url = format!("{}{}", self.address, path);
        let req = self.http.get(url).query(query);
        match &self.token {
            Some(token) => req.header(TOKEN_HEADER, token),
            None => req,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, NomadError> {
        let resp = self.request(path, query).await?;
        let body = resp
            .bytes()
            .await
            .map_err(|e| NomadError::transport(path, e))?;
        serde_json::from_slice(&body).map_err(|e| NomadError::decode(path, e))
    }
}

async fn check_status(path: &str, resp: Response) -> Result<Response, NomadError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    Err(status_error(path, status, &body))
}

fn status_error(path: &str, status: StatusCode, body: &str) -> NomadError {
    NomadError::Status {
        path: path.to_string(),
        status: status.as_u16(),
        body: body.trim().to_string(),
    }
}

/// Path segment for an object ID.
pub(crate) fn encode_id(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl NomadApi for NomadHttpClient {
    fn address(&self) -> &str {
        &self.address
    }

    async fn jobs(&self, opts: &SearchOptions) -> Result<Vec<Job>, NomadError> {
        jobs::fetch_jobs(self, opts).await
    }

    async fn namespaces(&self, opts: &SearchOptions) -> Result<Vec<Namespace>, NomadError> {
        namespaces::fetch_namespaces(self, opts).await
    }

    async fn deployments(&self, opts: &SearchOptions) -> Result<Vec<Deployment>, NomadError> {
        deployments::fetch_deployments(self, opts).await
    }

    async fn task_groups(
        &self,
        job_id: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<TaskGroup>, NomadError> {
        task_groups::fetch_task_groups(self, job_id, opts).await
    }

    async fn allocations(&self, opts: &SearchOptions) -> Result<Vec<Allocation>, NomadError> {
        allocations::fetch_allocations(self, opts).await
    }

    async fn job_allocations(
        &self,
        job_id: &str,
        opts: &SearchOptions,
    ) -> Result<Vec<Allocation>, NomadError> {
        allocations::fetch_job_allocations(self, job_id, opts).await
    }

    async fn job_status(
        &self,
        job_id: &str,
        opts: &SearchOptions,
    ) -> Result<JobStatus, NomadError> {
        job_status::fetch_job_status(self, job_id, opts).await
    }

    fn logs(&self, request: LogRequest, cancel: CancellationToken) -> LogChannels {
        spawn_log_pump(self.clone(), request, cancel)
    }

    async fn stream(&self, topics: &[Topic], index: u64) -> Result<EventReceiver, NomadError> {
        open_event_stream(self, topics, index).await
    }
}
