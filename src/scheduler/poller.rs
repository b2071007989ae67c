use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::core::client::{NomadApi, SearchOptions};
use crate::core::state::runtime::cluster::cluster_state::ClusterState;
use crate::domain::common::model::Topic;
use crate::errors::NomadError;
use crate::watcher::subscription::Callback;
use crate::watcher::Watcher;

/// One fixed-interval sync job: how to fetch a slot and where to store it.
#[async_trait]
pub trait PollTask: Send + Sync + 'static {
    const TOPIC: Topic;
    type Output: Send + 'static;

    async fn fetch(&self, nomad: &dyn NomadApi, opts: &SearchOptions)
        -> Result<Self::Output, NomadError>;

    fn store(&self, state: &mut ClusterState, value: Self::Output);
}

impl<N: NomadApi> Watcher<N> {
    /// Load `task`'s slot now, make it the active view, then keep it fresh
    /// every `refresh_interval` until the next view switch.
    pub(crate) async fn start_polling<T: PollTask>(&self, task: T, callback: Callback) {
        let task = Arc::new(task);
        self.poll_once(task.as_ref()).await;

        self.subscribe_callback(&[T::TOPIC], callback);
        self.notify(T::TOPIC);

        let token = CancellationToken::new();
        self.activities().add(token.clone());

        let span = info_span!("poller", topic = %T::TOPIC, activity = %Uuid::new_v4());
        let period = self.config().refresh_interval;
        let watcher = self.clone();
        tokio::spawn(async move { watcher.poll_loop(task, token, period).await }.instrument(span));
    }

    async fn poll_once<T: PollTask>(&self, task: &T) -> bool {
        let opts = self.search_options();
        match task.fetch(self.nomad(), &opts).await {
            Ok(value) => {
                self.repository().update(|s| task.store(s, value));
                true
            }
            Err(e) => {
                self.raise_error(&e.to_string());
                false
            }
        }
    }

    async fn poll_loop<T: PollTask>(&self, task: Arc<T>, token: CancellationToken, period: Duration) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let opts = self.search_options();
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                result = task.fetch(self.nomad(), &opts) => result,
            };

            match result {
                Ok(value) => {
                    self.repository().update(|s| task.store(s, value));
                    self.notify(T::TOPIC);
                }
                Err(e) => self.raise_error(&e.to_string()),
            }
        }
        debug!("Poller stopped");
    }
}
