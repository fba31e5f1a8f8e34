use crate::client::ParkingEndpoint;
use crate::error::{ParkspotError, Result};
use crate::events::{EventBus, ParkspotEvent};
use crate::inflight::InFlightGuard;
use crate::model::ProximityReading;
use crate::state::ParkingState;
use crate::stats::{PollStats, PollStatsSnapshot};
use parking_lot::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

/// Result of a single poll cycle
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The reading changed and was stored
    Updated(ProximityReading),
    /// The endpoint repeated the current reading
    Unchanged(ProximityReading),
    /// The request failed; the previous reading was kept
    Failed(String),
    /// Another poll was still in flight; nothing was sent
    Skipped,
}

struct PollerCore {
    endpoint: Arc<dyn ParkingEndpoint>,
    state: Arc<ParkingState>,
    event_bus: Arc<EventBus>,
    stats: PollStats,
    in_flight: AtomicBool,
}

impl PollerCore {
    async fn poll_once(&self) -> PollOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            trace!("Poll already in flight, skipping");
            self.stats.record_skipped(1);
            return PollOutcome::Skipped;
        };

        self.stats.record_attempt();

        match self.endpoint.read_proximity().await {
            Ok(reading) => {
                self.stats.record_success();
                let changed = self.state.apply_reading(reading.clone());

                self.publish(ParkspotEvent::ProximityUpdated {
                    reading: reading.clone(),
                    changed,
                    timestamp: SystemTime::now(),
                })
                .await;

                if changed {
                    PollOutcome::Updated(reading)
                } else {
                    PollOutcome::Unchanged(reading)
                }
            }
            Err(e) => {
                self.stats.record_failure();
                let message = e.to_string();
                self.publish(ParkspotEvent::PollFailed {
                    error: message.clone(),
                })
                .await;
                PollOutcome::Failed(message)
            }
        }
    }

    async fn publish(&self, event: ParkspotEvent) {
        if let ParkspotEvent::PollFailed { error } = &event {
            if !self.event_bus.has_subscribers() {
                warn!("Poll failed: {}", error);
                return;
            }
        }

        if let Err(e) = self.event_bus.publish(event).await {
            debug!("Poll event not delivered: {}", e);
        }
    }
}

/// Polls the endpoint for proximity readings at a fixed interval.
///
/// Each cycle waits for its request to finish before the next tick is taken,
/// so there is never more than one poll in flight. Ticks that elapse during a
/// slow request are dropped and counted.
pub struct StatusPoller {
    core: Arc<PollerCore>,
    poll_interval: Duration,
    cancellation_token: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl StatusPoller {
    pub fn new(
        endpoint: Arc<dyn ParkingEndpoint>,
        state: Arc<ParkingState>,
        event_bus: Arc<EventBus>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            core: Arc::new(PollerCore {
                endpoint,
                state,
                event_bus,
                stats: PollStats::default(),
                in_flight: AtomicBool::new(false),
            }),
            poll_interval,
            cancellation_token: CancellationToken::new(),
            handle: Mutex::new(None),
        }
    }

    /// Run a single poll cycle outside the schedule
    pub async fn poll_once(&self) -> PollOutcome {
        self.core.poll_once().await
    }

    pub fn stats(&self) -> PollStatsSnapshot {
        self.core.stats.snapshot()
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start the polling task. The first poll is issued immediately.
    pub fn start(&self) -> Result<()> {
        let mut handle = self.handle.lock();
        if handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(ParkspotError::component(
                "poller".to_string(),
                "already running".to_string(),
            ));
        }
        if self.cancellation_token.is_cancelled() {
            return Err(ParkspotError::component(
                "poller".to_string(),
                "cannot restart a stopped poller".to_string(),
            ));
        }

        info!("Starting status poller every {:?}", self.poll_interval);

        let core = Arc::clone(&self.core);
        let token = self.cancellation_token.clone();
        let poll_interval = self.poll_interval;

        *handle = Some(tokio::spawn(async move {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let started = Instant::now();
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Poller cancelled with a request in flight");
                        break;
                    }
                    outcome = core.poll_once() => {
                        trace!("Poll outcome: {:?}", outcome);
                    }
                }

                let overrun = started.elapsed().as_nanos() / poll_interval.as_nanos().max(1);
                core.stats.record_skipped(overrun as u64);
            }

            debug!("Status poller task exited");
        }));

        Ok(())
    }

    /// Cancel the polling task and wait for it to exit
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping status poller");
        self.cancellation_token.cancel();

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            handle.await.map_err(|e| {
                ParkspotError::component("poller".to_string(), format!("task failed: {}", e))
            })?;
        }

        let stats = self.stats();
        info!(
            "Status poller stopped: {} attempts, {} failures, {} skipped ticks",
            stats.attempts, stats.failures, stats.skipped_ticks
        );
        Ok(())
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}
