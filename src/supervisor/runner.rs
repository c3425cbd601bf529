//! Supervisor loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::time::{interval_at, sleep, Instant, Interval, MissedTickBehavior};

use crate::blockchain::LedgerQuery;
use crate::config::SupervisorConfig;
use crate::feed::{EventFilter, FeedMessage, Subscription, SubscriptionManager, SubscriptionStatus, Termination};
use crate::notify::Notifier;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;
use crate::responder::Responder;
use crate::supervisor::state::SupervisorState;

/// Message sent before a proactive rotation.
pub const ROTATION_MESSAGE: &str = "Reconnecting WebSocket to prevent rate limit issues...";

/// Supervisor timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Pacing between failed connection attempts.
    pub retry: RetryPolicy,
    /// Age at which a live subscription is replaced.
    pub rotation_interval: Duration,
}

impl From<&SupervisorConfig> for SupervisorSettings {
    fn from(config: &SupervisorConfig) -> Self {
        Self {
            retry: RetryPolicy::from(config),
            rotation_interval: Duration::from_secs(config.rotation_interval_secs),
        }
    }
}

/// Why the live phase ended.
enum LiveExit {
    Failed(Termination),
    Rotate,
    Shutdown,
}

/// Owns the one live subscription and keeps it alive.
pub struct Supervisor {
    subscriptions: SubscriptionManager,
    filter: EventFilter,
    probe: Arc<dyn LedgerQuery>,
    responder: Arc<Responder>,
    notifier: Notifier,
    settings: SupervisorSettings,
    state: watch::Sender<SupervisorState>,
    current: Option<Subscription>,
}

impl Supervisor {
    pub fn new(
        subscriptions: SubscriptionManager,
        filter: EventFilter,
        probe: Arc<dyn LedgerQuery>,
        responder: Arc<Responder>,
        notifier: Notifier,
        settings: SupervisorSettings,
    ) -> Self {
        let (state, _) = watch::channel(SupervisorState::Idle);
        Self {
            subscriptions,
            filter,
            probe,
            responder,
            notifier,
            settings,
            state,
            current: None,
        }
    }

    /// Read-only view of the supervisor state.
    pub fn state(&self) -> watch::Receiver<SupervisorState> {
        self.state.subscribe()
    }

    /// Run until shutdown.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            contract = %self.filter.contract,
            event = %self.filter.event_signature,
            rotation_secs = self.settings.rotation_interval.as_secs(),
            "Supervisor starting"
        );

        let period = self.settings.rotation_interval;
        let mut rotation = interval_at(Instant::now() + period, period);
        rotation.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.transition(SupervisorState::Connecting);
        match self.reconnect(&mut shutdown).await {
            Some(height) => {
                tracing::info!(block = height, "Current Block Number: {}", height);
                self.notifier.notify(format!("Current Block Number: {}", height));
            }
            None => return self.stop().await,
        }
        rotation.reset();

        loop {
            match self.watch_live(&mut rotation, &mut shutdown).await {
                LiveExit::Shutdown => break,
                LiveExit::Failed(termination) => {
                    self.transition(SupervisorState::Failed);
                    metrics::record_reconnect("failed");
                    tracing::error!(%termination, "WebSocket subscription ended, reconnecting");
                    self.notifier
                        .notify(format!("WebSocket connection {}. Reconnecting...", termination));
                }
                LiveExit::Rotate => {
                    self.transition(SupervisorState::Rotating);
                    metrics::record_reconnect("rotation");
                    tracing::info!("{}", ROTATION_MESSAGE);
                    self.notifier.notify(ROTATION_MESSAGE);
                }
            }

            self.transition(SupervisorState::Connecting);
            match self.reconnect(&mut shutdown).await {
                Some(height) => tracing::info!(block = height, "Reconnected"),
                None => break,
            }
            // Rotation measures subscription age; restart the clock.
            rotation.reset();
        }

        self.stop().await;
    }

    /// Tear down the current subscription, then connect a fresh one.
    ///
    /// The only place subscriptions are created, so the old one is always
    /// closed before its replacement exists. Returns the probed chain height,
    /// or `None` if shutdown arrived first.
    async fn reconnect(&mut self, shutdown: &mut broadcast::Receiver<()>) -> Option<u64> {
        if let Some(mut previous) = self.current.take() {
            previous.close().await;
            metrics::record_subscription_live(false);
            tracing::debug!(subscription = %previous.id(), "Previous subscription closed");
        }

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.probe.block_number().await {
                Ok(height) => {
                    let mut subscription = self.subscriptions.open(&self.filter).await;
                    if subscription.status() == SubscriptionStatus::Live {
                        self.current = Some(subscription);
                        metrics::record_subscription_live(true);
                        metrics::record_block_height(height);
                        self.transition(SupervisorState::Live);
                        return Some(height);
                    }
                    subscription.close().await;
                    tracing::warn!(attempt, "Subscription could not be opened");
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Liveness probe failed");
                }
            }

            let delay = self.settings.retry.delay(attempt);
            tracing::info!(attempt, delay_ms = delay.as_millis() as u64, "Retrying connection");
            tokio::select! {
                _ = sleep(delay) => {}
                _ = shutdown.recv() => return None,
            }
            self.transition(SupervisorState::Connecting);
        }
    }

    /// Forward notices until the subscription ends, rotation is due, or
    /// shutdown is requested.
    async fn watch_live(
        &mut self,
        rotation: &mut Interval,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> LiveExit {
        let Some(subscription) = self.current.as_mut() else {
            return LiveExit::Failed(Termination::Closed);
        };

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => return LiveExit::Shutdown,
                message = subscription.next() => match message {
                    Some(FeedMessage::Notice(notice)) => {
                        tracing::info!(
                            subscription = %subscription.id(),
                            trigger = ?notice.trigger_id,
                            block = notice.observed_at_block,
                            "Ping event detected"
                        );
                        // Never awaited here: a slow reaction must not stall the feed.
                        self.responder.spawn(notice);
                    }
                    Some(FeedMessage::Terminated(termination)) => return LiveExit::Failed(termination),
                    None => return LiveExit::Failed(Termination::Closed),
                },
                _ = rotation.tick() => return LiveExit::Rotate,
            }
        }
    }

    async fn stop(&mut self) {
        if let Some(mut subscription) = self.current.take() {
            subscription.close().await;
        }
        metrics::record_subscription_live(false);
        self.transition(SupervisorState::Idle);
        tracing::info!("Supervisor stopped");
    }

    fn transition(&self, next: SupervisorState) {
        let previous = *self.state.borrow();
        if !previous.can_transition_to(next) {
            tracing::warn!(from = %previous, to = %next, "Unexpected supervisor transition");
        }
        self.state.send_replace(next);
        tracing::debug!(from = %previous, to = %next, "Supervisor state changed");
    }
}
