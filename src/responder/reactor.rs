//! Reaction pipeline: validate → claim → submit → confirm.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::blockchain::types::ConfirmationStatus;
use crate::feed::EventNotice;
use crate::observability::metrics;
use crate::responder::ledger::ReactionLedger;
use crate::responder::types::{ReactionError, ReactionTx};
use crate::responder::ReactionSubmitter;

/// Reacts to event notices by submitting pong transactions.
///
/// Shared read-only across concurrent reactions; the only mutable state is
/// the ledger, which is internally synchronized.
pub struct Responder {
    submitter: Arc<dyn ReactionSubmitter>,
    ledger: Arc<ReactionLedger>,
}

impl Responder {
    pub fn new(submitter: Arc<dyn ReactionSubmitter>, ledger: Arc<ReactionLedger>) -> Self {
        Self { submitter, ledger }
    }

    pub fn ledger(&self) -> &ReactionLedger {
        &self.ledger
    }

    /// React to one notice.
    ///
    /// Malformed and duplicate notices return an error without any
    /// submission. Submission and confirmation failures are recorded on the
    /// returned [`ReactionTx`] and are never retried here.
    pub async fn react(&self, notice: EventNotice) -> Result<ReactionTx, ReactionError> {
        let Some(target) = notice.trigger_id else {
            tracing::error!(
                block = notice.observed_at_block,
                log_index = ?notice.log_index,
                "Event notice has no transaction hash, dropping"
            );
            metrics::record_reaction("malformed");
            return Err(ReactionError::MalformedNotice {
                observed_at_block: notice.observed_at_block,
            });
        };

        let mut reaction = ReactionTx::new(target, notice.observed_at_block);
        if let Err(status) = self.ledger.try_claim(reaction.clone()) {
            tracing::info!(trigger = %target, ?status, "Trigger already answered, skipping");
            metrics::record_reaction("duplicate");
            return Err(ReactionError::Duplicate { target, status });
        }

        tracing::info!(trigger = %target, block = notice.observed_at_block, "Submitting pong");

        let tx_hash = match self.submitter.submit(target).await {
            Ok(hash) => hash,
            Err(e) => {
                tracing::error!(trigger = %target, error = %e, "Pong submission failed");
                metrics::record_reaction("failed");
                reaction.fail(e.to_string());
                self.ledger.update(&reaction);
                return Ok(reaction);
            }
        };
        reaction.submission_hash = Some(tx_hash);
        self.ledger.update(&reaction);
        metrics::record_reaction("submitted");
        tracing::info!(trigger = %target, tx_hash = %tx_hash, "Pong submitted, awaiting confirmation");

        match self.submitter.await_confirmation(tx_hash).await {
            Ok(ConfirmationStatus::Confirmed { tx_hash, block_number }) => {
                tracing::info!(trigger = %target, tx_hash = %tx_hash, block = block_number, "Pong confirmed");
                metrics::record_reaction("confirmed");
                reaction.confirm(tx_hash, block_number);
            }
            Ok(ConfirmationStatus::Failed { tx_hash, reason }) => {
                tracing::error!(trigger = %target, tx_hash = %tx_hash, reason = %reason, "Pong failed on-chain");
                metrics::record_reaction("failed");
                reaction.fail(reason);
            }
            Err(e) => {
                tracing::error!(trigger = %target, tx_hash = %tx_hash, error = %e, "Pong confirmation failed");
                metrics::record_reaction("failed");
                reaction.fail(e.to_string());
            }
        }

        self.ledger.update(&reaction);
        Ok(reaction)
    }

    /// Run [`react`](Self::react) as an independent task.
    ///
    /// The task owns a handle to the responder only, so it survives the
    /// subscription that delivered the notice.
    pub fn spawn(self: &Arc<Self>, notice: EventNotice) -> JoinHandle<()> {
        let responder = Arc::clone(self);
        let span = tracing::info_span!(
            "reaction",
            trigger = ?notice.trigger_id,
            block = notice.observed_at_block
        );
        tokio::spawn(
            async move {
                // Outcome is already logged inside react().
                let _ = responder.react(notice).await;
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::types::{BlockchainError, BlockchainResult};
    use crate::responder::types::ReactionStatus;
    use alloy::primitives::{TxHash, B256};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSubmitter {
        submitted: Mutex<Vec<B256>>,
        fail_submit: bool,
        revert: bool,
    }

    #[async_trait]
    impl ReactionSubmitter for RecordingSubmitter {
        async fn submit(&self, target: B256) -> BlockchainResult<TxHash> {
            self.submitted.lock().unwrap().push(target);
            if self.fail_submit {
                return Err(BlockchainError::Rpc("nonce too low".to_string()));
            }
            Ok(TxHash::repeat_byte(0xee))
        }

        async fn await_confirmation(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
            if self.revert {
                return Ok(ConfirmationStatus::Failed {
                    tx_hash,
                    reason: "Transaction reverted".to_string(),
                });
            }
            Ok(ConfirmationStatus::Confirmed { tx_hash, block_number: 42 })
        }
    }

    fn responder(submitter: Arc<RecordingSubmitter>) -> Responder {
        Responder::new(submitter, Arc::new(ReactionLedger::new(Duration::from_secs(60))))
    }

    fn notice(trigger: Option<B256>) -> EventNotice {
        EventNotice {
            trigger_id: trigger,
            observed_at_block: 40,
            log_index: Some(0),
        }
    }

    #[tokio::test]
    async fn test_missing_trigger_never_submits() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let responder = responder(submitter.clone());

        let err = responder.react(notice(None)).await.unwrap_err();
        assert_eq!(err, ReactionError::MalformedNotice { observed_at_block: 40 });
        assert!(submitter.submitted.lock().unwrap().is_empty());
        assert!(responder.ledger().is_empty());
    }

    #[tokio::test]
    async fn test_confirmed_reaction_records_hash_once() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let responder = responder(submitter.clone());
        let target = B256::repeat_byte(0xab);

        let reaction = responder.react(notice(Some(target))).await.unwrap();
        assert_eq!(reaction.target, target);
        assert_eq!(reaction.submission_hash, Some(TxHash::repeat_byte(0xee)));
        assert_eq!(reaction.confirmation_hash, Some(TxHash::repeat_byte(0xee)));
        assert_eq!(reaction.status, ReactionStatus::Confirmed { block_number: 42 });

        // Same trigger delivered again (e.g. after a reconnect).
        let err = responder.react(notice(Some(target))).await.unwrap_err();
        assert!(matches!(err, ReactionError::Duplicate { .. }));
        assert_eq!(*submitter.submitted.lock().unwrap(), vec![target]);
    }

    #[tokio::test]
    async fn test_submission_failure_is_recorded_not_retried() {
        let submitter = Arc::new(RecordingSubmitter {
            fail_submit: true,
            ..Default::default()
        });
        let responder = responder(submitter.clone());
        let target = B256::repeat_byte(1);

        let reaction = responder.react(notice(Some(target))).await.unwrap();
        assert!(matches!(reaction.status, ReactionStatus::Failed(ref r) if r.contains("nonce too low")));
        assert_eq!(reaction.submission_hash, None);
        assert_eq!(submitter.submitted.lock().unwrap().len(), 1);
        assert_eq!(responder.ledger().summary(), (0, 0, 1));
    }

    #[tokio::test]
    async fn test_reverted_reaction_is_failed() {
        let submitter = Arc::new(RecordingSubmitter {
            revert: true,
            ..Default::default()
        });
        let responder = responder(submitter.clone());

        let reaction = responder.react(notice(Some(B256::repeat_byte(3)))).await.unwrap();
        assert_eq!(reaction.status, ReactionStatus::Failed("Transaction reverted".to_string()));
        assert_eq!(reaction.confirmation_hash, None);
    }

    #[tokio::test]
    async fn test_spawned_reactions_run_concurrently() {
        let submitter = Arc::new(RecordingSubmitter::default());
        let responder = Arc::new(responder(submitter.clone()));

        let handles: Vec<_> = (1..=3u8)
            .map(|b| responder.spawn(notice(Some(B256::repeat_byte(b)))))
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(submitter.submitted.lock().unwrap().len(), 3);
        assert_eq!(responder.ledger().summary(), (0, 3, 0));
    }
}
