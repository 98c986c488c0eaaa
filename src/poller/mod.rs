//! Background breach state poller.
//!
//! Periodically fetches `/breach/status` and publishes the latest state on a
//! `tokio::sync::watch` channel. The cadence adapts to what the last
//! response said: a fast interval while a breach is active (the war room
//! countdown and timeline need it) and a slow one while idle. Fetch failures
//! are logged at debug level and the previous state stays published, so a
//! flaky backend degrades to a stale dashboard rather than an error storm.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::models::BreachState;
use crate::api::ApiClient;
use crate::config::PollConfig;

pub struct BreachPoller {
    api: Arc<ApiClient>,
    active_interval: Duration,
    idle_interval: Duration,
}

impl BreachPoller {
    pub fn new(api: Arc<ApiClient>, poll: &PollConfig) -> Self {
        Self {
            api,
            active_interval: Duration::from_secs(poll.active_secs),
            idle_interval: Duration::from_secs(poll.idle_secs),
        }
    }

    fn next_delay(&self, state: &BreachState) -> Duration {
        if state.active {
            self.active_interval
        } else {
            self.idle_interval
        }
    }

    /// Run a single fetch, publishing on success.
    async fn poll_once(&self, tx: &watch::Sender<BreachState>) -> BreachState {
        match self.api.breach_status().await {
            Ok(state) => {
                // send_if_modified keeps change notifications meaningful for
                // receivers that only redraw on updates.
                tx.send_if_modified(|current| {
                    if *current == state {
                        false
                    } else {
                        *current = state.clone();
                        true
                    }
                });
                state
            }
            Err(e) => {
                tracing::debug!(error = %e, "Breach status poll failed");
                tx.borrow().clone()
            }
        }
    }

    async fn run(self, tx: watch::Sender<BreachState>, cancel: CancellationToken) {
        loop {
            let state = self.poll_once(&tx).await;
            let delay = self.next_delay(&state);
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Breach poller stopped");
                    return;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Spawn the poller task, publishing on `tx`. The task stops when `cancel`
/// fires; the caller owns the channel so the poller can be restarted on the
/// same channel after a logout/login cycle.
pub fn spawn_breach_poller(
    api: Arc<ApiClient>,
    poll: &PollConfig,
    tx: watch::Sender<BreachState>,
    cancel: CancellationToken,
) {
    let poller = BreachPoller::new(api, poll);
    tracing::info!(
        active_secs = poll.active_secs,
        idle_secs = poll.idle_secs,
        "Starting breach status poller"
    );
    tokio::spawn(poller.run(tx, cancel));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionStore;

    fn test_poller(active: u64, idle: u64) -> BreachPoller {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionStore::load(dir.path());
        let api = Arc::new(ApiClient::new("http://localhost:8000", 5, session).unwrap());
        BreachPoller::new(
            api,
            &PollConfig {
                active_secs: active,
                idle_secs: idle,
                ..PollConfig::default()
            },
        )
    }

    #[test]
    fn test_active_breach_uses_fast_interval() {
        let poller = test_poller(2, 10);
        let state = BreachState {
            active: true,
            ..BreachState::default()
        };
        assert_eq!(poller.next_delay(&state), Duration::from_secs(2));
    }

    #[test]
    fn test_idle_uses_slow_interval() {
        let poller = test_poller(2, 10);
        let state = BreachState::default();
        assert_eq!(poller.next_delay(&state), Duration::from_secs(10));
    }
}
