//! Feed types.

use alloy::primitives::{Address, B256};
use alloy::rpc::types::{Filter, Log};
use thiserror::Error;

/// What the subscription listens for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    /// Emitting contract.
    pub contract: Address,
    /// Solidity event signature, e.g. `Ping()`.
    pub event_signature: String,
}

impl EventFilter {
    pub fn new(contract: Address, event_signature: impl Into<String>) -> Self {
        Self {
            contract,
            event_signature: event_signature.into(),
        }
    }

    /// The alloy log filter (address + topic0).
    pub fn to_filter(&self) -> Filter {
        Filter::new()
            .address(self.contract)
            .event(&self.event_signature)
    }
}

/// A watched event, as observed on the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventNotice {
    /// Hash of the transaction that emitted the event.
    pub trigger_id: Option<B256>,
    /// Block the event was included in (0 when the node omitted it).
    pub observed_at_block: u64,
    /// Position of the log in its block.
    pub log_index: Option<u64>,
}

impl EventNotice {
    pub fn from_log(log: &Log) -> Self {
        Self {
            trigger_id: log.transaction_hash,
            observed_at_block: log.block_number.unwrap_or_default(),
            log_index: log.log_index,
        }
    }
}

/// Why a subscription stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The remote side ended the stream.
    Closed,
    /// The transport failed.
    Errored(String),
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Closed => write!(f, "closed"),
            Termination::Errored(reason) => write!(f, "errored: {}", reason),
        }
    }
}

/// One item read from a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedMessage {
    Notice(EventNotice),
    /// Terminal signal; nothing follows it on the same subscription.
    Terminated(Termination),
}

/// Subscription lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    Connecting,
    Live,
    Closed,
    Errored,
}

impl SubscriptionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionStatus::Closed | SubscriptionStatus::Errored)
    }
}

/// Transport-level feed failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("connect to {url} failed: {reason}")]
    Connect { url: String, reason: String },

    #[error("connect to {url} timed out after {secs} seconds")]
    ConnectTimeout { url: String, secs: u64 },

    #[error("subscribe failed: {0}")]
    Subscribe(String),

    #[error("subscription lagged, {0} notifications dropped")]
    Lagged(u64),

    #[error("transport error: {0}")]
    Transport(String),
}
