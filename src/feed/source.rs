//! Event feed collaborator seam.

use alloy::rpc::types::Log;
use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::feed::types::{EventFilter, FeedError};

/// Raw log stream of one subscription.
///
/// Stream end means the connection closed; an `Err` item means the
/// transport failed. Neither is followed by further items.
pub type RawLogStream = BoxStream<'static, Result<Log, FeedError>>;

/// Subscribe-by-filter primitive over a persistent streaming transport.
///
/// Dropping the returned stream unsubscribes.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn subscribe(&self, filter: &EventFilter) -> Result<RawLogStream, FeedError>;
}
