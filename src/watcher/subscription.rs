use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::domain::common::model::{HandlerKind, Topic};

/// Invoked on the dispatcher thread when a subscribed topic changes.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Receives a formatted message for one `HandlerKind`.
pub type HandlerFn = Arc<dyn Fn(&str) + Send + Sync>;

#[derive(Clone)]
struct Subscription {
    topics: HashSet<Topic>,
    callback: Callback,
}

/// The single active view subscription plus the process-wide handler table.
#[derive(Default)]
pub struct SubscriptionRegistry {
    current: Mutex<Option<Subscription>>,
    handlers: RwLock<[Option<HandlerFn>; 3]>,
}

fn slot(kind: HandlerKind) -> usize {
    match kind {
        HandlerKind::Error => 0,
        HandlerKind::Fatal => 1,
        HandlerKind::Info => 2,
    }
}

impl SubscriptionRegistry {
    pub fn replace(&self, topics: &[Topic], callback: Callback) {
        *self.current.lock() = Some(Subscription {
            topics: topics.iter().copied().collect(),
            callback,
        });
    }

    pub fn clear(&self) {
        *self.current.lock() = None;
    }

    pub fn is_subscribed(&self, topic: Topic) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|s| s.topics.contains(&topic))
    }

    /// The callback to run for `topic`, if the current view listens to it.
    pub fn callback_for(&self, topic: Topic) -> Option<Callback> {
        self.current
            .lock()
            .as_ref()
            .filter(|s| s.topics.contains(&topic))
            .map(|s| s.callback.clone())
    }

    pub fn topics(&self) -> Vec<Topic> {
        self.current
            .lock()
            .as_ref()
            .map(|s| s.topics.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn set_handler(&self, kind: HandlerKind, handler: HandlerFn) {
        self.handlers.write()[slot(kind)] = Some(handler);
    }

    pub fn handler(&self, kind: HandlerKind) -> Option<HandlerFn> {
        self.handlers.read()[slot(kind)].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn callback_only_for_subscribed_topics() {
        let registry = SubscriptionRegistry::default();
        assert!(registry.callback_for(Topic::Job).is_none());

        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        registry.replace(
            &[Topic::Job, Topic::Allocation],
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(registry.callback_for(Topic::Deployment).is_none());
        if let Some(cb) = registry.callback_for(Topic::Allocation) {
            cb();
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        registry.clear();
        assert!(!registry.is_subscribed(Topic::Job));
        assert!(registry.topics().is_empty());
    }

    #[test]
    fn handlers_survive_subscription_changes() {
        let registry = SubscriptionRegistry::default();
        registry.set_handler(HandlerKind::Fatal, Arc::new(|_msg: &str| {}));
        registry.replace(&[Topic::Namespace], Arc::new(|| {}));
        registry.clear();

        assert!(registry.handler(HandlerKind::Fatal).is_some());
        assert!(registry.handler(HandlerKind::Error).is_none());
    }
}
