use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::core::client::NomadApi;
use crate::domain::common::model::{HandlerKind, Topic};
use crate::errors::NomadError;
use crate::watcher::Watcher;

const STREAM_CLOSED: &str = "event stream closed";

impl<N: NomadApi> Watcher<N> {
    /// Ask the stream consumer to refresh the current view. Never blocks; a
    /// request already waiting absorbs this one.
    pub fn force_update(&self) {
        let _ = self.inner.force_tx.try_send(());
    }

    /// Run `watch` on the Tokio runtime.
    pub fn spawn_watch(&self) -> JoinHandle<()> {
        let watcher = self.clone();
        tokio::spawn(async move { watcher.watch().await })
    }

    /// Consume the server event stream until it fails or closes.
    ///
    /// Jobs, deployments and allocations are loaded once up front, then
    /// reloaded whenever the stream reports a change to their topic.
    pub async fn watch(&self) {
        let taken = self.inner.force_rx.lock().take();
        let Some(mut force_rx) = taken else {
            warn!("Event stream consumer already running");
            return;
        };

        let span = info_span!("stream", activity = %Uuid::new_v4());
        async {
            for topic in Topic::STREAMED {
                self.refresh(topic).await;
            }

            let index = self.config().event_start_index;
            let mut events = match self.nomad().stream(&Topic::STREAMED, index).await {
                Ok(events) => events,
                Err(e) => {
                    self.notify_handler(HandlerKind::Fatal, &e.to_string());
                    return;
                }
            };
            info!("Watching events from index {}", index);

            loop {
                tokio::select! {
                    item = events.recv() => match item {
                        Some(Ok(batch)) => {
                            debug!("Event batch at index {} ({} event(s))", batch.index, batch.events.len());
                            for topic in batch.topics() {
                                self.refresh(topic).await;
                            }
                        }
                        Some(Err(e)) => {
                            self.notify_handler(HandlerKind::Fatal, &e.to_string());
                            return;
                        }
                        None => {
                            self.notify_handler(HandlerKind::Fatal, STREAM_CLOSED);
                            return;
                        }
                    },
                    Some(()) = force_rx.recv() => {
                        debug!("Forced update");
                        for topic in self.subscribed_topics() {
                            self.refresh(topic).await;
                        }
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Reload one streamed slot and notify on success. Non-streamed topics
    /// have their own pollers and are only notified.
    async fn refresh(&self, topic: Topic) {
        let opts = self.search_options();
        let nomad = self.nomad();

        let result: Result<(), NomadError> = match topic {
            Topic::Job => nomad
                .jobs(&opts)
                .await
                .map(|jobs| self.repository().update(|s| s.set_jobs(jobs))),
            Topic::Deployment => nomad
                .deployments(&opts)
                .await
                .map(|deployments| self.repository().update(|s| s.set_deployments(deployments))),
            Topic::Allocation => nomad
                .allocations(&opts)
                .await
                .map(|allocations| self.repository().update(|s| s.set_allocations(allocations))),
            _ => Ok(()),
        };

        match result {
            Ok(()) => self.notify(topic),
            Err(e) => self.raise_error(&e.to_string()),
        }
    }
}
