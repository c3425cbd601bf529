//! Health reporter task.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::{broadcast, watch};
use tokio::time::{self, Instant};

use crate::blockchain::LedgerQuery;
use crate::notify::Notifier;
use crate::observability::metrics;
use crate::supervisor::SupervisorState;

/// One successful ledger sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessSample {
    pub block_height: u64,
    pub timestamp: DateTime<Utc>,
}

impl LivenessSample {
    pub fn new(block_height: u64) -> Self {
        Self {
            block_height,
            timestamp: Utc::now(),
        }
    }

    /// Human-readable status line.
    pub fn status_line(&self, state: SupervisorState) -> String {
        format!(
            "Everything is working - Current Block: {}, Timestamp: {} (state: {})",
            self.block_height,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            state
        )
    }
}

pub struct HealthReporter {
    ledger: Arc<dyn LedgerQuery>,
    notifier: Notifier,
    interval: Duration,
    state: watch::Receiver<SupervisorState>,
}

impl HealthReporter {
    pub fn new(
        ledger: Arc<dyn LedgerQuery>,
        notifier: Notifier,
        interval: Duration,
        state: watch::Receiver<SupervisorState>,
    ) -> Self {
        Self {
            ledger,
            notifier,
            interval,
            state,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Health reporter starting");

        // First report one full interval after start.
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.report().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health reporter received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Sample the ledger once and emit the status line.
    pub async fn report(&self) -> Option<LivenessSample> {
        match self.ledger.block_number().await {
            Ok(height) => {
                metrics::record_rpc_health("observation", true);
                metrics::record_block_height(height);

                let sample = LivenessSample::new(height);
                let state = *self.state.borrow();
                let line = sample.status_line(state);
                tracing::info!(block = height, %state, "{}", line);
                self.notifier.notify(line);
                Some(sample)
            }
            Err(e) => {
                metrics::record_rpc_health("observation", false);
                tracing::error!(error = %e, "Health check failed");
                None
            }
        }
    }
}
