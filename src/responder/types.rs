//! Reaction records and errors.

use alloy::primitives::{TxHash, B256};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Lifecycle of a reaction transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionStatus {
    /// Claimed or submitted, not yet settled.
    Pending,
    /// Mined with the required confirmations.
    Confirmed { block_number: u64 },
    /// Submission or confirmation failed. Not retried.
    Failed(String),
}

impl ReactionStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, ReactionStatus::Pending)
    }
}

/// A pong sent in answer to one observed ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionTx {
    /// Trigger identifier being answered.
    pub target: B256,
    /// Block the triggering event was observed in.
    pub observed_at_block: u64,
    /// When the reaction was started.
    pub submitted_at: DateTime<Utc>,
    /// Hash returned by the node on submission.
    pub submission_hash: Option<TxHash>,
    /// Hash of the mined pong, once confirmed.
    pub confirmation_hash: Option<TxHash>,
    pub status: ReactionStatus,
}

impl ReactionTx {
    pub fn new(target: B256, observed_at_block: u64) -> Self {
        Self {
            target,
            observed_at_block,
            submitted_at: Utc::now(),
            submission_hash: None,
            confirmation_hash: None,
            status: ReactionStatus::Pending,
        }
    }

    pub fn confirm(&mut self, tx_hash: TxHash, block_number: u64) {
        self.confirmation_hash = Some(tx_hash);
        self.status = ReactionStatus::Confirmed { block_number };
    }

    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = ReactionStatus::Failed(reason.into());
    }
}

/// Reasons a notice produced no submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactionError {
    /// The notice carried no trigger identifier.
    #[error("notice at block {observed_at_block} has no trigger identifier")]
    MalformedNotice { observed_at_block: u64 },

    /// The trigger is already being (or has been) answered.
    #[error("trigger {target} already has a reaction ({status:?})")]
    Duplicate { target: B256, status: ReactionStatus },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reaction_transitions() {
        let mut reaction = ReactionTx::new(B256::repeat_byte(1), 10);
        assert_eq!(reaction.status, ReactionStatus::Pending);
        assert!(!reaction.status.is_settled());

        reaction.confirm(TxHash::repeat_byte(2), 12);
        assert_eq!(reaction.confirmation_hash, Some(TxHash::repeat_byte(2)));
        assert_eq!(reaction.status, ReactionStatus::Confirmed { block_number: 12 });
        assert!(reaction.status.is_settled());
    }

    #[test]
    fn test_error_display() {
        let err = ReactionError::MalformedNotice { observed_at_block: 7 };
        assert_eq!(err.to_string(), "notice at block 7 has no trigger identifier");
    }
}
