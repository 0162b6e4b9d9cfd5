//! One-shot completion reporting
//!
//! When a session reaches its last step the popularity sink is called once.
//! The call runs in its own task so the player never waits on it; failures
//! are logged and dropped.

use crate::content::CompletionSink;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub struct CompletionReporter {
    sink: Arc<dyn CompletionSink>,
    fired: bool,
    pending: Option<JoinHandle<()>>,
}

impl CompletionReporter {
    pub fn new(sink: Arc<dyn CompletionSink>) -> Self {
        Self {
            sink,
            fired: false,
            pending: None,
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Record completion of `activity_id`; returns false if already reported
    ///
    /// Must be called from within a tokio runtime.
    pub fn report(&mut self, activity_id: &str) -> bool {
        if self.fired {
            debug!("Completion for {} already reported", activity_id);
            return false;
        }
        self.fired = true;

        let sink = Arc::clone(&self.sink);
        let activity_id = activity_id.to_string();
        self.pending = Some(tokio::spawn(async move {
            match sink.increment_popularity(&activity_id).await {
                Ok(()) => debug!("Recorded completion of {}", activity_id),
                Err(e) => warn!("Failed to record completion of {}: {}", activity_id, e),
            }
        }));
        true
    }

    /// Wait for an in-flight report to finish
    pub async fn flush(&mut self) {
        if let Some(handle) = self.pending.take() {
            if let Err(e) = handle.await {
                warn!("Completion report task failed: {}", e);
            }
        }
    }
}

impl std::fmt::Debug for CompletionReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionReporter")
            .field("fired", &self.fired)
            .field("pending", &self.pending.is_some())
            .finish()
    }
}
