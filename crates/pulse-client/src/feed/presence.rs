//! Presence ping: periodic lightweight POST announcing the viewer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pulse_proto::PresencePing;
use url::Url;

/// Cancellable handle for the presence task.
#[derive(Debug)]
pub struct PresenceHandle {
    running: Arc<AtomicBool>,
    task: tokio::task::JoinHandle<()>,
}

impl PresenceHandle {
    /// Check whether the presence task is still active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    /// Stop the presence task.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

/// Start the periodic presence ping. Failures are silent; the next ping
/// proceeds on schedule.
pub(crate) fn start_presence_task(
    http: reqwest::Client,
    url: Url,
    session_id: String,
    interval: Duration,
) -> PresenceHandle {
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);

    let task = tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tick.tick().await;
            if !flag.load(Ordering::SeqCst) {
                break;
            }

            let ping = PresencePing::new(session_id.as_str());
            match http.post(url.clone()).json(&ping).send().await {
                Ok(_) => tracing::trace!(session = %session_id, "presence ping sent"),
                Err(e) => tracing::debug!(error = %e, "ignoring presence ping failure"),
            }
        }
    });

    PresenceHandle { running, task }
}
