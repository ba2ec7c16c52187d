//! Periodic background fetch of the stats endpoint.
//!
//! A tokio task fetches once per period and pushes each outcome into an
//! mpsc channel. The UI drains the channel with the non-blocking
//! [`PollLoop::poll`] once per frame.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::http::StatsClient;
use super::snapshot::StatsPayload;
use super::FetchError;

/// Lifecycle of the background poll task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Fetching,
    CoolingDown,
    Stopped,
}

impl PollState {
    pub fn label(&self) -> &'static str {
        match self {
            PollState::Idle => "idle",
            PollState::Fetching => "fetching",
            PollState::CoolingDown => "waiting",
            PollState::Stopped => "stopped",
        }
    }
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum PollDelivery {
    Snapshot {
        payload: StatsPayload,
        received_at: DateTime<Local>,
    },
    /// The fetch failed; consumers keep their previous values.
    Unavailable(FetchError),
}

/// Timing of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub period: Duration,
    /// Upper bound on a single fetch. Expected to be shorter than `period`.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(2),
            timeout: Duration::from_millis(1500),
        }
    }
}

/// Delay before the next fetch, given how long the last cycle took.
///
/// A cycle that overran the period starts the next one immediately.
pub fn next_delay(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Handle to the background poll task.
///
/// Dropping the handle stops the task.
pub struct PollLoop {
    receiver: mpsc::Receiver<PollDelivery>,
    state: watch::Receiver<PollState>,
    stop_tx: watch::Sender<bool>,
    wake: Arc<Notify>,
    description: String,
}

impl fmt::Debug for PollLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollLoop")
            .field("state", &*self.state.borrow())
            .field("description", &self.description)
            .finish()
    }
}

impl PollLoop {
    /// Spawn the poll task on the current tokio runtime.
    pub fn spawn(client: Arc<dyn StatsClient>, config: PollConfig) -> Self {
        let (tx, rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(PollState::Idle);
        let (stop_tx, stop_rx) = watch::channel(false);
        let wake = Arc::new(Notify::new());
        let description = client.description().to_string();

        tokio::spawn(run(client, config, tx, state_tx, stop_rx, wake.clone()));

        Self {
            receiver: rx,
            state: state_rx,
            stop_tx,
            wake,
            description,
        }
    }

    /// Take the next pending delivery without blocking.
    pub fn poll(&mut self) -> Option<PollDelivery> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the next delivery. `None` once the task has ended.
    pub async fn recv(&mut self) -> Option<PollDelivery> {
        self.receiver.recv().await
    }

    pub fn state(&self) -> PollState {
        *self.state.borrow()
    }

    /// Watch state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<PollState> {
        self.state.clone()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Fetch again without waiting out the cool-down. A request made while
    /// a fetch is in flight ends the following cool-down early.
    pub fn refresh_now(&self) {
        self.wake.notify_one();
    }

    /// Ask the task to stop. Takes effect before the next fetch, or
    /// immediately if a fetch or cool-down is in progress.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }
}

async fn run(
    client: Arc<dyn StatsClient>,
    config: PollConfig,
    tx: mpsc::Sender<PollDelivery>,
    state_tx: watch::Sender<PollState>,
    mut stop_rx: watch::Receiver<bool>,
    wake: Arc<Notify>,
) {
    info!(
        source = client.description(),
        period_ms = config.period.as_millis() as u64,
        timeout_ms = config.timeout.as_millis() as u64,
        "poll loop started"
    );

    let set_state = |state: PollState| {
        debug!(state = state.label(), "poll state");
        state_tx.send_replace(state);
    };

    loop {
        if *stop_rx.borrow() {
            break;
        }

        set_state(PollState::Fetching);
        let started = Instant::now();

        let outcome = tokio::select! {
            result = tokio::time::timeout(config.timeout, client.fetch_stats()) => {
                result.map_err(FetchError::from).and_then(|r| r)
            }
            _ = stop_rx.changed() => break,
        };

        // a result that lands after stop is dropped
        if *stop_rx.borrow() {
            break;
        }

        let delivery = match outcome {
            Ok(payload) => PollDelivery::Snapshot {
                payload,
                received_at: Local::now(),
            },
            Err(e) => {
                warn!(error = %e, "stats fetch failed");
                PollDelivery::Unavailable(e)
            }
        };

        if tx.send(delivery).await.is_err() {
            // receiver dropped
            break;
        }

        set_state(PollState::CoolingDown);
        let delay = next_delay(config.period, started.elapsed());
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wake.notified() => debug!("cool-down cut short"),
            _ = stop_rx.changed() => break,
        }
        set_state(PollState::Idle);
    }

    set_state(PollState::Stopped);
    info!("poll loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RawEvent;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Client that answers after a fixed delay.
    struct SlowClient {
        delay: Duration,
        fail: bool,
        calls: AtomicUsize,
    }

    impl SlowClient {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                delay,
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                delay: Duration::ZERO,
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl StatsClient for SlowClient {
        async fn fetch_stats(&self) -> Result<StatsPayload, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(FetchError::Http("API returned status 503".into()));
            }
            Ok(serde_json::from_value(serde_json::json!({"cpu": 10})).unwrap())
        }

        async fn fetch_day(&self, _date: NaiveDate) -> Result<Vec<RawEvent>, FetchError> {
            Ok(Vec::new())
        }

        fn description(&self) -> &str {
            "test"
        }
    }

    fn config(period_ms: u64, timeout_ms: u64) -> PollConfig {
        PollConfig {
            period: Duration::from_millis(period_ms),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    #[test]
    fn test_next_delay() {
        let period = Duration::from_secs(2);
        assert_eq!(next_delay(period, Duration::from_millis(300)), Duration::from_millis(1700));
        assert_eq!(next_delay(period, period), Duration::ZERO);
        // overran the period: go again straight away
        assert_eq!(next_delay(period, Duration::from_secs(3)), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_once_per_period() {
        let client = SlowClient::new(Duration::ZERO);
        let mut poll = PollLoop::spawn(client.clone(), config(2000, 1500));

        tokio::time::sleep(Duration::from_millis(5000)).await;

        let mut snapshots = 0;
        while let Some(delivery) = poll.poll() {
            assert!(matches!(delivery, PollDelivery::Snapshot { .. }));
            snapshots += 1;
        }
        // t = 0, 2s and 4s
        assert_eq!(snapshots, 3);
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_time_counts_against_the_period() {
        let client = SlowClient::new(Duration::from_millis(500));
        let mut poll = PollLoop::spawn(client.clone(), config(2000, 1500));

        tokio::time::sleep(Duration::from_millis(4200)).await;

        // fetches start at 0, 2s, 4s; the one at 4s has not finished yet
        assert_eq!(client.calls.load(Ordering::SeqCst), 3);
        let mut delivered = 0;
        while poll.poll().is_some() {
            delivered += 1;
        }
        assert_eq!(delivered, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_unavailable() {
        let client = SlowClient::new(Duration::from_secs(10));
        let mut poll = PollLoop::spawn(client, config(2000, 1000));

        let delivery = poll.recv().await.unwrap();
        assert_eq!(delivery, PollDelivery::Unavailable(FetchError::Timeout));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_end_the_loop() {
        let client = SlowClient::failing();
        let mut poll = PollLoop::spawn(client.clone(), config(100, 50));

        for _ in 0..3 {
            let delivery = poll.recv().await.unwrap();
            assert!(matches!(delivery, PollDelivery::Unavailable(FetchError::Http(_))));
        }
        assert!(client.calls.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_now_skips_the_cool_down() {
        let client = SlowClient::new(Duration::ZERO);
        let mut poll = PollLoop::spawn(client.clone(), config(10_000, 1500));

        assert!(poll.recv().await.is_some());
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(poll.state(), PollState::CoolingDown);

        poll.refresh_now();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(matches!(poll.poll(), Some(PollDelivery::Snapshot { .. })));
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_cool_down() {
        let client = SlowClient::new(Duration::ZERO);
        let mut poll = PollLoop::spawn(client.clone(), config(2000, 1500));
        let mut state = poll.subscribe_state();

        assert!(poll.recv().await.is_some());
        poll.stop();
        state
            .wait_for(|s| *s == PollState::Stopped)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        assert_eq!(poll.state(), PollState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_after_stop_is_discarded() {
        let client = SlowClient::new(Duration::from_millis(1000));
        let mut poll = PollLoop::spawn(client.clone(), config(2000, 1500));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(poll.state(), PollState::Fetching);
        poll.stop();

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(poll.poll().is_none());
        assert_eq!(poll.state(), PollState::Stopped);
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
