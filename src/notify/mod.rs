//! Notification subsystem.
//!
//! # Data Flow
//! ```text
//! Notifier::notify(text)          (returns immediately)
//!     → spawned delivery task
//!     → NotificationChannel::deliver  (telegram.rs: POST sendMessage)
//!     → failure? log it, done
//! ```
//!
//! # Design Decisions
//! - Secondary observability channel: no retry, no queue
//! - Delivery errors never reach the caller

pub mod telegram;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::TelegramConfig;
use crate::observability::metrics;

pub use telegram::TelegramChannel;

/// Notification delivery failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("unreadable response (HTTP {status}): {reason}")]
    Decode { status: u16, reason: String },

    #[error("rejected by remote: {0}")]
    Rejected(String),
}

/// External messaging endpoint.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn deliver(&self, text: &str) -> Result<(), NotifyError>;
}

/// Fire-and-forget notifier.
#[derive(Clone, Default)]
pub struct Notifier {
    channel: Option<Arc<dyn NotificationChannel>>,
}

impl Notifier {
    pub fn new(channel: Arc<dyn NotificationChannel>) -> Self {
        Self {
            channel: Some(channel),
        }
    }

    /// A notifier that only logs.
    pub fn log_only() -> Self {
        Self { channel: None }
    }

    /// Telegram notifier when enabled, log-only otherwise.
    pub fn from_config(config: &TelegramConfig) -> Self {
        if !config.enabled {
            tracing::info!("Telegram notifications disabled");
            return Self::log_only();
        }
        match TelegramChannel::new(config) {
            Ok(channel) => Self::new(Arc::new(channel)),
            Err(e) => {
                tracing::error!(error = %e, "Telegram channel unavailable, notifications will only be logged");
                Self::log_only()
            }
        }
    }

    /// Send `message` in the background.
    pub fn notify(&self, message: impl Into<String>) {
        let message = message.into();
        let Some(channel) = self.channel.clone() else {
            tracing::debug!(%message, "Notification (log only)");
            return;
        };

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(%message, "No runtime available, notification dropped");
            return;
        };

        handle.spawn(async move {
            match channel.deliver(&message).await {
                Ok(()) => {
                    metrics::record_notification(true);
                    tracing::debug!("Notification delivered");
                }
                Err(e) => {
                    metrics::record_notification(false);
                    tracing::warn!(error = %e, "Notification delivery failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FlakyChannel {
        delivered: Mutex<Vec<String>>,
        attempts: Mutex<u32>,
    }

    #[async_trait]
    impl NotificationChannel for FlakyChannel {
        async fn deliver(&self, text: &str) -> Result<(), NotifyError> {
            let mut attempts = self.attempts.lock().unwrap();
            *attempts += 1;
            if *attempts % 2 == 1 {
                return Err(NotifyError::Rejected("Too Many Requests".to_string()));
            }
            self.delivered.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let channel = Arc::new(FlakyChannel::default());
        let notifier = Notifier::new(channel.clone());

        notifier.notify("first");
        tokio::time::sleep(Duration::from_millis(20)).await;
        notifier.notify("second");
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(*channel.attempts.lock().unwrap(), 2);
        assert_eq!(*channel.delivered.lock().unwrap(), vec!["second".to_string()]);
    }

    #[test]
    fn test_notify_outside_runtime_does_not_panic() {
        let notifier = Notifier::new(Arc::new(FlakyChannel::default()));
        notifier.notify("no runtime here");
        Notifier::log_only().notify("nor here");
    }

    #[test]
    fn test_disabled_config_is_log_only() {
        let notifier = Notifier::from_config(&TelegramConfig::default());
        assert!(notifier.channel.is_none());
    }
}
