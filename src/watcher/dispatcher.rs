use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::trace;

use crate::domain::common::model::{HandlerKind, Topic};
use crate::watcher::subscription::SubscriptionRegistry;

/// A message from background work to the UI side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Signal {
    Changed(Topic),
    Handler(HandlerKind, String),
}

/// Topics with a `Changed` signal still in the queue. A topic is queued at
/// most once until the dispatcher takes it.
#[derive(Debug, Default)]
pub(crate) struct PendingChanges {
    topics: Mutex<HashSet<Topic>>,
}

impl PendingChanges {
    /// Mark `topic` pending. Returns `false` if it already was.
    pub fn insert(&self, topic: Topic) -> bool {
        self.topics.lock().insert(topic)
    }

    fn take(&self, topic: Topic) {
        self.topics.lock().remove(&topic);
    }
}

/// Runs subscription callbacks and handlers on whichever thread drives it.
///
/// Subscriptions are checked again at dispatch time, so a change queued
/// before a view switch never reaches the next view unless it listens to
/// the same topic.
pub struct Dispatcher {
    signals: mpsc::UnboundedReceiver<Signal>,
    subscriptions: Arc<SubscriptionRegistry>,
    pending: Arc<PendingChanges>,
}

impl Dispatcher {
    pub(crate) fn new(
        signals: mpsc::UnboundedReceiver<Signal>,
        subscriptions: Arc<SubscriptionRegistry>,
        pending: Arc<PendingChanges>,
    ) -> Self {
        Self {
            signals,
            subscriptions,
            pending,
        }
    }

    /// Dispatch everything queued right now without waiting. Returns the
    /// number of signals drained.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(signal) = self.signals.try_recv() {
            self.dispatch(signal);
            count += 1;
        }
        count
    }

    /// Wait for one signal and dispatch it. Returns `false` once every
    /// `Watcher` handle is gone.
    pub async fn next(&mut self) -> bool {
        match self.signals.recv().await {
            Some(signal) => {
                self.dispatch(signal);
                true
            }
            None => false,
        }
    }

    /// Dispatch until every `Watcher` handle is gone.
    pub async fn run(mut self) {
        while self.next().await {}
    }

    fn dispatch(&self, signal: Signal) {
        match signal {
            Signal::Changed(topic) => {
                // Released before the callback so changes it causes queue again.
                self.pending.take(topic);
                // Clone out of the lock so the callback may resubscribe.
                if let Some(callback) = self.subscriptions.callback_for(topic) {
                    callback();
                } else {
                    trace!("Dropping stale change for {}", topic);
                }
            }
            Signal::Handler(kind, message) => {
                if let Some(handler) = self.subscriptions.handler(kind) {
                    handler(&message);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn dispatcher() -> (
        mpsc::UnboundedSender<Signal>,
        Arc<SubscriptionRegistry>,
        Arc<PendingChanges>,
        Dispatcher,
    ) {
        let registry = Arc::new(SubscriptionRegistry::default());
        let pending = Arc::new(PendingChanges::default());
        let (tx, rx) = mpsc::unbounded_channel();
        let dispatcher = Dispatcher::new(rx, registry.clone(), pending.clone());
        (tx, registry, pending, dispatcher)
    }

    #[test]
    fn stale_changes_are_dropped_at_dispatch_time() {
        let (tx, registry, _pending, mut dispatcher) = dispatcher();

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        registry.replace(
            &[Topic::Job],
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        tx.send(Signal::Changed(Topic::Job)).unwrap();

        // View switch before the UI thread gets to the queued change.
        registry.replace(&[Topic::Namespace], Arc::new(|| {}));

        assert_eq!(dispatcher.dispatch_pending(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn next_reports_closed_channel() {
        let (tx, _registry, _pending, mut dispatcher) = dispatcher();

        tx.send(Signal::Handler(HandlerKind::Info, "hello".into()))
            .unwrap();
        drop(tx);

        assert!(dispatcher.next().await);
        assert!(!dispatcher.next().await);
    }

    #[test]
    fn dispatch_releases_pending_topic() {
        let (tx, registry, pending, mut dispatcher) = dispatcher();
        registry.replace(&[Topic::Log], Arc::new(|| {}));

        assert!(pending.insert(Topic::Log));
        assert!(!pending.insert(Topic::Log));
        tx.send(Signal::Changed(Topic::Log)).unwrap();
        dispatcher.dispatch_pending();

        assert!(pending.insert(Topic::Log));
    }

    #[tokio::test]
    async fn run_drains_until_senders_are_gone() {
        let (tx, registry, _pending, dispatcher) = dispatcher();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.set_handler(
            HandlerKind::Fatal,
            Arc::new(move |msg: &str| sink.lock().push(msg.to_string())),
        );

        let handle = tokio::spawn(dispatcher.run());
        tx.send(Signal::Handler(HandlerKind::Fatal, "lost leader".into()))
            .unwrap();
        tx.send(Signal::Handler(HandlerKind::Fatal, "stream closed".into()))
            .unwrap();
        drop(tx);
        handle.await.unwrap();

        assert_eq!(
            *seen.lock(),
            vec!["lost leader".to_string(), "stream closed".to_string()]
        );
    }
}
