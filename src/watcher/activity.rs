use std::collections::VecDeque;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Cancellation tokens of every background task started for the current
/// view.
#[derive(Debug, Default)]
pub struct ActivityPool {
    tokens: Mutex<VecDeque<CancellationToken>>,
}

impl ActivityPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, token: CancellationToken) {
        self.tokens.lock().push_back(token);
    }

    /// Cancel every registered token, oldest first, and empty the pool.
    pub fn deactivate_all(&self) {
        let drained: Vec<CancellationToken> = self.tokens.lock().drain(..).collect();
        if drained.is_empty() {
            return;
        }

        debug!("Deactivating {} activity(ies)", drained.len());
        for token in drained {
            token.cancel();
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.lock().is_empty()
    }
}
