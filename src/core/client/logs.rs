use bytes::Bytes;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::client::nomad_client::{encode_id, NomadHttpClient};
use crate::domain::common::model::LogSource;
use crate::errors::NomadError;

const LOG_CHANNEL_CAPACITY: usize = 32;

/// Which task output to tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRequest {
    pub allocation_id: String,
    pub task_name: String,
    pub source: LogSource,
}

/// Receiving halves of a log tail.
#[derive(Debug)]
pub struct LogChannels {
    pub frames: mpsc::Receiver<Bytes>,
    pub errors: mpsc::Receiver<NomadError>,
}

impl LogChannels {
    /// A connected pair of channels; the senders go to whoever produces
    /// frames.
    pub fn pair() -> (mpsc::Sender<Bytes>, mpsc::Sender<NomadError>, Self) {
        let (frames_tx, frames) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        let (errors_tx, errors) = mpsc::channel(LOG_CHANNEL_CAPACITY);
        (frames_tx, errors_tx, Self { frames, errors })
    }
}

fn log_query(request: &LogRequest, offset: u64) -> Vec<(&'static str, String)> {
    vec![
        ("task", request.task_name.clone()),
        ("type", request.source.as_str().to_string()),
        ("follow", "true".to_string()),
        ("origin", "end".to_string()),
        ("offset", offset.to_string()),
        ("plain", "true".to_string()),
    ]
}

/// Spawn a task streaming `/v1/client/fs/logs` into fresh channels until
/// `cancel` fires or the server ends the body.
pub(crate) fn spawn_log_pump(
    client: NomadHttpClient,
    request: LogRequest,
    cancel: CancellationToken,
) -> LogChannels {
    let (frames_tx, errors_tx, channels) = LogChannels::pair();

    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Log pump for {}/{} cancelled", request.allocation_id, request.task_name);
            }
            _ = pump_logs(&client, &request, &frames_tx, &errors_tx) => {}
        }
    });

    channels
}

async fn pump_logs(
    client: &NomadHttpClient,
    request: &LogRequest,
    frames_tx: &mpsc::Sender<Bytes>,
    errors_tx: &mpsc::Sender<NomadError>,
) {
    let path = format!("/v1/client/fs/logs/{}", encode_id(&request.allocation_id));
    let query = log_query(request, client.log_offset());

    let resp = match client.request(&path, &query).await {
        Ok(resp) => resp,
        Err(e) => {
            let _ = errors_tx.send(e).await;
            return;
        }
    };

    info!(
        "Tailing {} of {}/{}",
        request.source, request.allocation_id, request.task_name
    );

    let mut body = resp.bytes_stream();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) if bytes.is_empty() => {}
            Ok(bytes) => {
                if frames_tx.send(bytes).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                let _ = errors_tx.send(NomadError::transport(&path, e)).await;
                return;
            }
        }
    }
}
