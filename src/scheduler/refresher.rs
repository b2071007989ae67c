use std::time::Duration;

use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::config::DEFAULT_REFRESH_INTERVAL;
use crate::watcher::activity::ActivityPool;

/// Calls a closure on a fixed interval, for views that redraw without new
/// cluster data. At most one loop runs per refresher.
pub struct Refresher {
    interval: Duration,
    activities: ActivityPool,
}

impl Refresher {
    /// A zero `interval` falls back to the default of two seconds.
    pub fn new(interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            DEFAULT_REFRESH_INTERVAL
        } else {
            interval
        };

        Self {
            interval,
            activities: ActivityPool::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Replace the running loop with one calling `f`. `f` runs once right
    /// away, then on every tick.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn refresh<F>(&self, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.activities.deactivate_all();
        let token = CancellationToken::new();
        self.activities.add(token.clone());

        f();

        let period = self.interval;
        let span = info_span!("refresher", activity = %Uuid::new_v4());
        tokio::spawn(
            async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => f(),
                    }
                }
                debug!("Refresher stopped");
            }
            .instrument(span),
        );
    }

    pub fn stop(&self) {
        self.activities.deactivate_all();
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.stop();
    }
}
