//! Responder subsystem.
//!
//! # Data Flow
//! ```text
//! EventNotice (from the supervisor, one spawned task per notice)
//!     → reactor.rs (validate trigger id)
//!     → ledger.rs (claim trigger, reject duplicates)
//!     → ReactionSubmitter::submit (pong on the submission channel)
//!     → ReactionSubmitter::await_confirmation
//!     → ReactionTx { Confirmed | Failed } recorded in the ledger
//! ```
//!
//! # Design Decisions
//! - No automatic retry of a reaction; a failed trigger is only answered
//!   again if the feed delivers it again
//! - Reactions are independent; no ordering between them

pub mod ledger;
pub mod reactor;
pub mod types;

use alloy::primitives::{TxHash, B256};
use async_trait::async_trait;

use crate::blockchain::types::{BlockchainResult, ConfirmationStatus};

pub use ledger::ReactionLedger;
pub use reactor::Responder;
pub use types::{ReactionError, ReactionStatus, ReactionTx};

/// Transaction collaborator: submit a signed pong and await its outcome.
#[async_trait]
pub trait ReactionSubmitter: Send + Sync {
    /// Submit a reaction referencing `target`; returns the pending tx hash.
    async fn submit(&self, target: B256) -> BlockchainResult<TxHash>;

    /// Wait until the submitted transaction is confirmed or fails.
    async fn await_confirmation(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus>;
}
