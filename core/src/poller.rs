use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::api::{fetch_json, ApiClient, ApiRequest};
use crate::model::StatusSnapshot;
use crate::{targets, Error};

pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_millis(2000);

pub const POOL_STATUS_PATH: &str = "/api/lucky/status";
pub const INSTANCE_STATUS_PATH: &str = "/api/qbit/status";
pub const CONTROLLER_STATE_PATH: &str = "/api/qbit/controller-state";

/// Receives one complete snapshot per successful tick.
pub trait StatusRenderer: Send + Sync + 'static {
    fn render(&self, snapshot: StatusSnapshot);
}

/// Keeps only the latest snapshot; readers pull it on their own schedule.
#[derive(Debug, Clone, Default)]
pub struct LatestSnapshot {
    slot: Arc<Mutex<Option<StatusSnapshot>>>,
    renders: Arc<AtomicU64>,
}

impl LatestSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<StatusSnapshot> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn render_count(&self) -> u64 {
        self.renders.load(Ordering::Relaxed)
    }
}

impl StatusRenderer for LatestSnapshot {
    fn render(&self, snapshot: StatusSnapshot) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(snapshot);
        }
        self.renders.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Clone)]
pub struct StatusPoller {
    client: Arc<dyn ApiClient>,
    period: Duration,
}

impl StatusPoller {
    pub fn new(client: Arc<dyn ApiClient>) -> Self {
        Self::with_period(client, DEFAULT_POLL_PERIOD)
    }

    pub fn with_period(client: Arc<dyn ApiClient>, period: Duration) -> Self {
        Self { client, period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Issues the three status requests concurrently; the first failure wins.
    pub async fn fetch_snapshot(&self) -> Result<StatusSnapshot, Error> {
        let client = self.client.as_ref();
        let (pool, instances, controller) = tokio::try_join!(
            fetch_json::<serde_json::Value>(client, ApiRequest::get(POOL_STATUS_PATH)),
            fetch_json::<serde_json::Value>(client, ApiRequest::get(INSTANCE_STATUS_PATH)),
            fetch_json::<serde_json::Value>(client, ApiRequest::get(CONTROLLER_STATE_PATH)),
        )?;

        Ok(StatusSnapshot {
            pool,
            instances,
            controller,
        })
    }

    /// Starts ticking on the current tokio runtime.
    ///
    /// The first tick fires one period after the call. Every tick spawns its
    /// own fetch, so a slow tick never delays the next one and fetches may
    /// overlap. Stopping the schedule does not cancel fetches already issued.
    pub fn spawn<R: StatusRenderer>(self, renderer: Arc<R>) -> PollerHandle {
        let counters = Arc::new(PollCounters::default());
        let loop_counters = Arc::clone(&counters);
        let period = self.period;
        let first_tick = Instant::now() + period;

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);
            loop {
                ticker.tick().await;
                let tick = loop_counters.ticks.fetch_add(1, Ordering::Relaxed) + 1;
                loop_counters.in_flight.fetch_add(1, Ordering::Relaxed);
                trace!(target: targets::POLLING, tick, "Status tick");

                let poller = self.clone();
                let renderer = Arc::clone(&renderer);
                let counters = Arc::clone(&loop_counters);
                tokio::spawn(async move {
                    let result = poller.fetch_snapshot().await;
                    counters.in_flight.fetch_sub(1, Ordering::Relaxed);
                    match result {
                        Ok(snapshot) => {
                            debug!(target: targets::POLLING, tick, "Status snapshot rendered");
                            renderer.render(snapshot);
                        }
                        Err(error) => {
                            counters.failures.fetch_add(1, Ordering::Relaxed);
                            warn!(
                                target: targets::POLLING,
                                tick,
                                error = %error.technical_detail(),
                                "Status update failed; skipping render"
                            );
                        }
                    }
                });
            }
        });

        PollerHandle {
            inner: Arc::new(PollerTask { task, counters }),
        }
    }
}

#[derive(Debug, Default)]
struct PollCounters {
    ticks: AtomicU64,
    failures: AtomicU64,
    in_flight: AtomicUsize,
}

#[derive(Debug)]
struct PollerTask {
    task: JoinHandle<()>,
    counters: Arc<PollCounters>,
}

impl Drop for PollerTask {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Owner of a running poll schedule. The schedule stops when `stop` is called
/// or the last clone is dropped.
#[derive(Debug, Clone)]
pub struct PollerHandle {
    inner: Arc<PollerTask>,
}

impl PollerHandle {
    pub fn stop(&self) {
        debug!(target: targets::POLLING, "Status poller stopped");
        self.inner.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.inner.task.is_finished()
    }

    pub fn ticks(&self) -> u64 {
        self.inner.counters.ticks.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.inner.counters.failures.load(Ordering::Relaxed)
    }

    /// Fetches issued but not yet settled, across all ticks.
    pub fn in_flight(&self) -> usize {
        self.inner.counters.in_flight.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::api::{Method, MockApiClient, MockReply};

    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    fn healthy_backend() -> MockApiClient {
        let mock = MockApiClient::new();
        mock.set_fallback(Method::Get, POOL_STATUS_PATH, MockReply::ok(&json!({"active": 2})));
        mock.set_fallback(
            Method::Get,
            INSTANCE_STATUS_PATH,
            MockReply::ok(&json!([{"name": "seedbox", "connected": true}])),
        );
        mock.set_fallback(
            Method::Get,
            CONTROLLER_STATE_PATH,
            MockReply::ok(&json!({"limited": false})),
        );
        mock
    }

    #[derive(Default)]
    struct RecordingRenderer {
        frames: Mutex<Vec<StatusSnapshot>>,
    }

    impl StatusRenderer for RecordingRenderer {
        fn render(&self, snapshot: StatusSnapshot) {
            self.frames.lock().expect("frames lock").push(snapshot);
        }
    }

    impl RecordingRenderer {
        fn frames(&self) -> Vec<StatusSnapshot> {
            self.frames.lock().expect("frames lock").clone()
        }
    }

    #[tokio::test]
    async fn fetch_snapshot_combines_all_three_sources() {
        let poller = StatusPoller::new(Arc::new(healthy_backend()));
        let snapshot = poller.fetch_snapshot().await.expect("snapshot");
        assert_eq!(snapshot.pool["active"], 2);
        assert_eq!(snapshot.instances[0]["name"], "seedbox");
        assert_eq!(snapshot.controller["limited"], false);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_a_fixed_period() {
        let mock = healthy_backend();
        let renderer = Arc::new(RecordingRenderer::default());
        let handle = StatusPoller::new(Arc::new(mock.clone())).spawn(Arc::clone(&renderer));

        tokio::time::advance(Duration::from_millis(1999)).await;
        settle().await;
        assert_eq!(handle.ticks(), 0);
        assert!(renderer.frames().is_empty());

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(handle.ticks(), 1);
        assert_eq!(renderer.frames().len(), 1);

        tokio::time::advance(Duration::from_millis(4000)).await;
        settle().await;
        assert_eq!(handle.ticks(), 3);
        assert_eq!(renderer.frames().len(), 3);
        assert_eq!(mock.request_count(Method::Get, CONTROLLER_STATE_PATH), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn one_failed_source_skips_the_whole_render() {
        let mock = healthy_backend();
        mock.push_reply(
            Method::Get,
            INSTANCE_STATUS_PATH,
            MockReply::json(503, &json!({"detail": "qbit down"})),
        );
        let renderer = Arc::new(RecordingRenderer::default());
        let handle = StatusPoller::new(Arc::new(mock)).spawn(Arc::clone(&renderer));

        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        assert_eq!(handle.ticks(), 1);
        assert_eq!(handle.failures(), 1);
        assert!(renderer.frames().is_empty());

        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        let frames = renderer.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].pool["active"], 2);
        assert_eq!(frames[0].instances[0]["connected"], true);
        assert_eq!(frames[0].controller, json!({"limited": false}));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_overlap_instead_of_backing_off() {
        let mock = MockApiClient::new();
        let slow = Duration::from_millis(4500);
        for path in [POOL_STATUS_PATH, INSTANCE_STATUS_PATH, CONTROLLER_STATE_PATH] {
            mock.set_fallback(Method::Get, path, MockReply::ok(&json!({})).with_delay(slow));
        }
        let renderer = Arc::new(LatestSnapshot::new());
        let handle = StatusPoller::new(Arc::new(mock.clone())).spawn(Arc::clone(&renderer));

        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        assert_eq!(handle.in_flight(), 1);

        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        assert_eq!(handle.ticks(), 2);
        assert_eq!(handle.in_flight(), 2);
        assert_eq!(mock.request_count(Method::Get, POOL_STATUS_PATH), 2);
        assert_eq!(renderer.render_count(), 0);

        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        // Tick 1 settled at 6500ms is not due yet; tick 3 joined the overlap.
        assert_eq!(handle.ticks(), 3);
        assert_eq!(handle.in_flight(), 3);

        tokio::time::advance(Duration::from_millis(600)).await;
        settle().await;
        assert_eq!(renderer.render_count(), 1);
        assert_eq!(handle.in_flight(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_scheduling_but_not_issued_fetches() {
        let mock = MockApiClient::new();
        for path in [POOL_STATUS_PATH, INSTANCE_STATUS_PATH, CONTROLLER_STATE_PATH] {
            mock.set_fallback(
                Method::Get,
                path,
                MockReply::ok(&json!({})).with_delay(Duration::from_millis(500)),
            );
        }
        let renderer = Arc::new(LatestSnapshot::new());
        let handle = StatusPoller::new(Arc::new(mock)).spawn(Arc::clone(&renderer));

        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;
        assert_eq!(handle.in_flight(), 1);

        handle.stop();
        settle().await;
        assert!(!handle.is_running());

        tokio::time::advance(Duration::from_millis(500)).await;
        settle().await;
        assert_eq!(renderer.render_count(), 1);

        tokio::time::advance(Duration::from_millis(10_000)).await;
        settle().await;
        assert_eq!(handle.ticks(), 1);
        assert_eq!(renderer.render_count(), 1);
    }
}
