//! Polling fallback: periodic full-refresh fetches of the feed snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pulse_proto::FeedSnapshot;
use url::Url;

use super::store::FeedStore;

/// Cancellable handle for the polling task.
#[derive(Debug)]
pub struct PollerHandle {
    running: Arc<AtomicBool>,
    task: tokio::task::JoinHandle<()>,
}

impl PollerHandle {
    /// Check whether the polling task is still active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst) && !self.task.is_finished()
    }

    /// Stop the polling task. Takes effect immediately; safe to call more
    /// than once.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.task.abort();
    }
}

/// Start the periodic snapshot poll.
///
/// The first fetch happens immediately; subsequent fetches follow the
/// interval. A failed poll is ignored — stale data is retained and the
/// next tick proceeds on schedule.
pub(crate) fn start_poll_task(
    http: reqwest::Client,
    url: Url,
    interval: Duration,
    store: FeedStore,
) -> PollerHandle {
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

            match http.get(url.clone()).send().await {
                Ok(response) => match response.json::<FeedSnapshot>().await {
                    Ok(snapshot) => {
                        tracing::debug!(items = snapshot.activities.len(), "feed snapshot refreshed");
                        store.replace(snapshot.activities);
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "ignoring snapshot decode failure");
                    }
                },
                Err(e) => {
                    tracing::debug!(error = %e, "ignoring poll failure");
                }
            }
        }
    });

    PollerHandle { running, task }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn unreachable_url() -> Url {
        // Bind then drop to get a port nothing is listening on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Url::parse(&format!("http://{addr}/activity/feed")).unwrap()
    }

    #[tokio::test]
    async fn test_poll_failures_are_silent() {
        let store = FeedStore::new(10);
        let handle = start_poll_task(
            reqwest::Client::new(),
            unreachable_url().await,
            Duration::from_millis(10),
            store.clone(),
        );

        tokio::time::sleep(Duration::from_millis(80)).await;

        // Several failed polls later the task is still on schedule and the
        // store is untouched.
        assert!(handle.is_running());
        assert!(store.is_empty());

        handle.stop();
    }

    #[tokio::test]
    async fn test_stop_is_immediate_and_idempotent() {
        let store = FeedStore::new(10);
        let handle = start_poll_task(
            reqwest::Client::new(),
            unreachable_url().await,
            Duration::from_millis(10),
            store,
        );

        assert!(handle.is_running());
        handle.stop();
        handle.stop();
        assert!(!handle.is_running());
    }
}
