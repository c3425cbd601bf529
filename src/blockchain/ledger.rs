//! Ledger query seam.

use async_trait::async_trait;

use crate::blockchain::types::BlockchainResult;

/// Request/response access to chain state.
///
/// Used by the supervisor as a liveness probe and by the health reporter for
/// sampling. Implemented by [`BlockchainClient`](crate::blockchain::BlockchainClient).
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Current chain height.
    async fn block_number(&self) -> BlockchainResult<u64>;
}
