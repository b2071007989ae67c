//! Nomad event stream (`/v1/event/stream`).
//!
//! The body is newline-delimited JSON. Each line is either a heartbeat (`{}`)
//! or a batch of events sharing one raft index.

use std::fmt::Display;

use bytes::{Bytes, BytesMut};
use futures::{pin_mut, Stream, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::core::client::mappers::map_event_batch;
use crate::core::client::nomad_client::NomadHttpClient;
use crate::core::client::nomad_resources::EventsResponse;
use crate::domain::cluster::EventBatch;
use crate::domain::common::model::Topic;
use crate::errors::NomadError;

const EVENT_STREAM_PATH: &str = "/v1/event/stream";
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Receiving half of an open event stream. An `Err` item is terminal: the
/// sender is dropped right after it.
pub type EventReceiver = mpsc::Receiver<Result<EventBatch, NomadError>>;

/// Splits a byte stream into lines.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: BytesMut,
}

impl LineDecoder {
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Next complete line without its terminator.
    pub fn next_line(&mut self) -> Option<Bytes> {
        let pos = self.buf.iter().position(|b| *b == b'\n')?;
        let mut line = self.buf.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }
        Some(line.freeze())
    }

    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Decode one NDJSON line. Heartbeats, blank lines and batches with no
/// tracked topic yield `Ok(None)`.
pub fn decode_event_line(line: &[u8]) -> Result<Option<EventBatch>, NomadError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let resp: EventsResponse =
        serde_json::from_slice(line).map_err(|e| NomadError::decode(EVENT_STREAM_PATH, e))?;
    Ok(map_event_batch(resp))
}

fn stream_query(topics: &[Topic], index: u64) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("index", index.to_string()),
        ("namespace", "*".to_string()),
    ];
    query.extend(topics.iter().map(|t| ("topic", format!("{}:*", t))));
    query
}

/// Connect to the event stream and spawn a pump feeding the returned
/// receiver. Connection and status failures are returned directly.
pub(crate) async fn open_event_stream(
    client: &NomadHttpClient,
    topics: &[Topic],
    index: u64,
) -> Result<EventReceiver, NomadError> {
    let resp = client
        .request(EVENT_STREAM_PATH, &stream_query(topics, index))
        .await?;

    info!("Event stream opened at index {} for {:?}", index, topics);
    let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    tokio::spawn(pump_events(resp.bytes_stream(), tx));
    Ok(rx)
}

/// Decode `body` into batches on `tx`. The first transport or decode error
/// is sent and ends the pump; so does the end of `body`. Either way `tx` is
/// dropped and the receiver sees the channel close.
async fn pump_events<S, E>(body: S, tx: mpsc::Sender<Result<EventBatch, NomadError>>)
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    pin_mut!(body);
    let mut decoder = LineDecoder::default();

    loop {
        let chunk = tokio::select! {
            _ = tx.closed() => {
                debug!("Event stream receiver dropped");
                return;
            }
            chunk = body.next() => chunk,
        };

        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                let _ = tx.send(Err(NomadError::transport(EVENT_STREAM_PATH, e))).await;
                return;
            }
            None => {
                info!("Event stream ended by server");
                return;
            }
        };

        decoder.push(&bytes);
        while let Some(line) = decoder.next_line() {
            match decode_event_line(&line) {
                Ok(Some(batch)) => {
                    if tx.send(Ok(batch)).await.is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }
    }
}
