//! The sync core the UI talks to.
//!
//! A `Watcher` owns the cluster snapshot, the active view subscription and
//! every background task feeding it. Background tasks never call into the UI
//! directly: they enqueue signals that the paired `Dispatcher` delivers.

pub mod activity;
pub mod dispatcher;
pub mod logs;
pub mod stream;
pub mod subscription;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::WatcherConfig;
use crate::core::client::{NomadApi, SearchOptions};
use crate::core::state::runtime::cluster::cluster_state::ClusterState;
use crate::core::state::runtime::cluster::cluster_state_repository::ClusterStateRepository;
use crate::domain::common::model::{HandlerKind, Topic};
use crate::watcher::activity::ActivityPool;
use crate::watcher::dispatcher::{Dispatcher, PendingChanges, Signal};
use crate::watcher::logs::LogResumeState;
use crate::watcher::subscription::{Callback, SubscriptionRegistry};

pub struct Watcher<N: NomadApi> {
    inner: Arc<Inner<N>>,
}

impl<N: NomadApi> Clone for Watcher<N> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<N> {
    nomad: N,
    config: WatcherConfig,
    state: ClusterStateRepository,
    subscriptions: Arc<SubscriptionRegistry>,
    activities: ActivityPool,
    signals: mpsc::UnboundedSender<Signal>,
    pending: Arc<PendingChanges>,
    search: RwLock<SearchOptions>,
    force_tx: mpsc::Sender<()>,
    force_rx: Mutex<Option<mpsc::Receiver<()>>>,
    log_resume: Mutex<Option<LogResumeState>>,
}

impl<N: NomadApi> Watcher<N> {
    /// Create a watcher and the dispatcher that delivers its callbacks.
    pub fn new(nomad: N, config: WatcherConfig) -> (Self, Dispatcher) {
        let (signals, signals_rx) = mpsc::unbounded_channel();
        // One slot: a pending force request absorbs later ones.
        let (force_tx, force_rx) = mpsc::channel(1);
        let subscriptions = Arc::new(SubscriptionRegistry::default());
        let pending = Arc::new(PendingChanges::default());

        let inner = Inner {
            nomad,
            state: ClusterStateRepository::new(ClusterState::new(
                config.log_max_lines,
                config.log_max_bytes,
            )),
            config,
            subscriptions: subscriptions.clone(),
            activities: ActivityPool::new(),
            signals,
            pending: pending.clone(),
            search: RwLock::new(SearchOptions::default()),
            force_tx,
            force_rx: Mutex::new(Some(force_rx)),
            log_resume: Mutex::new(None),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            Dispatcher::new(signals_rx, subscriptions, pending),
        )
    }

    /// Make `topics` the active view and stop all background work started
    /// for the previous one.
    pub fn subscribe<F>(&self, topics: &[Topic], callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_callback(topics, Arc::new(callback));
    }

    pub(crate) fn subscribe_callback(&self, topics: &[Topic], callback: Callback) {
        self.inner.subscriptions.replace(topics, callback);
        self.inner.activities.deactivate_all();
    }

    pub fn unsubscribe(&self) {
        self.inner.subscriptions.clear();
    }

    /// Queue a change for `topic`. Ignored unless the active view listens to
    /// it. Changes already waiting for the dispatcher absorb this one.
    pub fn notify(&self, topic: Topic) {
        if !self.inner.subscriptions.is_subscribed(topic) {
            return;
        }
        if self.inner.pending.insert(topic) {
            let _ = self.inner.signals.send(Signal::Changed(topic));
        }
    }

    pub fn subscribe_handler<F>(&self, kind: HandlerKind, handler: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.inner.subscriptions.set_handler(kind, Arc::new(handler));
    }

    pub fn notify_handler(&self, kind: HandlerKind, message: &str) {
        match kind {
            HandlerKind::Error => warn!("{}", message),
            HandlerKind::Fatal => error!("{}", message),
            HandlerKind::Info => info!("{}", message),
        }
        let _ = self
            .inner
            .signals
            .send(Signal::Handler(kind, message.to_string()));
    }

    /// Current snapshot of everything synchronized so far.
    pub fn state(&self) -> Arc<ClusterState> {
        self.inner.state.get()
    }

    pub fn search_options(&self) -> SearchOptions {
        self.inner.search.read().clone()
    }

    /// Scope later fetches to `namespace`; `None` means all namespaces.
    pub fn select_namespace(&self, namespace: Option<String>) {
        self.inner.search.write().namespace = namespace;
    }

    pub fn select_region(&self, region: Option<String>) {
        self.inner.search.write().region = region;
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.inner.config
    }

    pub fn nomad(&self) -> &N {
        &self.inner.nomad
    }

    pub(crate) fn repository(&self) -> &ClusterStateRepository {
        &self.inner.state
    }

    pub(crate) fn activities(&self) -> &ActivityPool {
        &self.inner.activities
    }

    pub(crate) fn subscribed_topics(&self) -> Vec<Topic> {
        self.inner.subscriptions.topics()
    }

    /// Record a recoverable failure and surface it through the Error
    /// handler. Snapshot slots are left as they were.
    pub(crate) fn raise_error(&self, message: &str) {
        self.inner
            .state
            .update(|state| state.mark_error(message.to_string()));
        self.notify_handler(HandlerKind::Error, message);
    }
}
