//! WebSocket event source backed by alloy's pubsub provider.

use std::time::Duration;

use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tokio::time::timeout;

use crate::config::ObservationConfig;
use crate::feed::source::{EventSource, RawLogStream};
use crate::feed::types::{EventFilter, FeedError};

/// Opens one WebSocket connection per subscription.
///
/// A fresh connection per subscription means rotating the subscription also
/// rotates the socket, which is what the feed provider's connection limits
/// require.
#[derive(Debug, Clone)]
pub struct WsEventSource {
    url: String,
    connect_timeout: Duration,
}

impl WsEventSource {
    pub fn new(url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            connect_timeout,
        }
    }

    pub fn from_config(config: &ObservationConfig) -> Self {
        Self::new(
            config.ws_url.clone(),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }
}

#[async_trait]
impl EventSource for WsEventSource {
    async fn subscribe(&self, filter: &EventFilter) -> Result<RawLogStream, FeedError> {
        let connect = ProviderBuilder::new().connect_ws(WsConnect::new(self.url.clone()));
        let provider = match timeout(self.connect_timeout, connect).await {
            Ok(Ok(provider)) => provider,
            Ok(Err(e)) => {
                return Err(FeedError::Connect {
                    url: self.url.clone(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(FeedError::ConnectTimeout {
                    url: self.url.clone(),
                    secs: self.connect_timeout.as_secs(),
                })
            }
        };

        let subscription = timeout(self.connect_timeout, provider.subscribe_logs(&filter.to_filter()))
            .await
            .map_err(|_| FeedError::Subscribe("timed out".to_string()))?
            .map_err(|e| FeedError::Subscribe(e.to_string()))?;

        tracing::debug!(url = %self.url, "WebSocket log subscription established");

        // The provider rides along in the stream state: dropping the stream
        // drops the subscription and closes the socket.
        let logs = stream::unfold(
            Some((provider, subscription)),
            |state| async move {
                let (provider, mut subscription) = state?;
                match subscription.recv().await {
                    Ok(log) => Some((Ok(log), Some((provider, subscription)))),
                    Err(RecvError::Closed) => None,
                    Err(RecvError::Lagged(missed)) => Some((Err(FeedError::Lagged(missed)), None)),
                }
            },
        );

        Ok(logs.boxed())
    }
}
