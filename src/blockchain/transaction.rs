//! Pong transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build pong calls with a gas price ceiling
//! - Reserve nonces so concurrent reactions do not collide
//! - Sign and broadcast through the submission channel
//! - Monitor confirmations

use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, TxHash, B256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, timeout, MissedTickBehavior};

use crate::blockchain::client::{BlockchainClient, RpcEndpoints};
use crate::blockchain::contract::{pongCall, Pong};
use crate::blockchain::types::{
    BlockchainConfig, BlockchainError, BlockchainResult, ConfirmationStatus,
};
use crate::blockchain::wallet::Wallet;
use crate::responder::ReactionSubmitter;

/// Submits pong calls through a wallet-enabled provider.
pub struct ChainSubmitter {
    /// Read access to the submission channel (gas, nonce, receipts).
    client: BlockchainClient,
    /// Signing provider on the primary submission URL.
    sender: Arc<dyn Provider + Send + Sync>,
    wallet: Wallet,
    contract: Address,
    config: BlockchainConfig,
}

impl ChainSubmitter {
    /// Create a submitter for `contract` on the configured submission channel.
    pub fn new(config: &BlockchainConfig, wallet: Wallet, contract: Address) -> BlockchainResult<Self> {
        let client = BlockchainClient::new(RpcEndpoints::from(config))?;
        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::Config(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let sender = ProviderBuilder::new()
            .wallet(EthereumWallet::from(wallet.signer().clone()))
            .connect_http(url);

        Ok(Self {
            client,
            sender: Arc::new(sender),
            wallet,
            contract,
            config: config.clone(),
        })
    }

    /// Check the node serves the chain the wallet signs for.
    pub async fn verify_chain(&self) -> BlockchainResult<()> {
        self.client.verify_chain_id(self.wallet.chain_id()).await
    }

    /// Build a pong transaction request answering `target`.
    pub async fn build(&self, target: B256) -> BlockchainResult<TransactionRequest> {
        let gas_price = self.client.get_gas_price().await?;
        let gas_price_gwei = gas_price / 1_000_000_000;

        // Check against max gas price
        if gas_price_gwei > self.config.max_gas_price_gwei as u128 {
            return Err(BlockchainError::GasPriceTooHigh {
                current_gwei: gas_price_gwei as u64,
                max_gwei: self.config.max_gas_price_gwei,
            });
        }

        // Apply multiplier for safety margin
        let adjusted_gas_price = (gas_price as f64 * self.config.gas_price_multiplier) as u128;

        let chain_nonce = self.client.get_pending_nonce(self.wallet.address()).await?;
        let nonce = self.wallet.reserve_nonce(chain_nonce);

        let data = pongCall { _txHash: target }.abi_encode();

        let tx = TransactionRequest::default()
            .with_from(self.wallet.address())
            .with_to(self.contract)
            .with_input(data)
            .with_nonce(nonce)
            .with_gas_price(adjusted_gas_price)
            .with_chain_id(self.wallet.chain_id())
            .with_gas_limit(self.config.gas_limit);

        Ok(tx)
    }

    /// Wait for a transaction to be confirmed.
    ///
    /// Polls the receipt until it has `confirmation_blocks` confirmations or
    /// `confirmation_timeout_secs` elapses.
    pub async fn wait_for_confirmation(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        let required_confirmations = self.config.confirmation_blocks;
        let timeout_duration = Duration::from_secs(self.config.confirmation_timeout_secs);
        let poll_interval = Duration::from_millis(self.config.receipt_poll_ms);

        let result = timeout(timeout_duration, async {
            let mut ticker = interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let receipt = match self.client.get_transaction_receipt(tx_hash).await {
                    Ok(Some(r)) => r,
                    Ok(None) => {
                        tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
                        continue;
                    }
                    // A flaky read is not a failed transaction; keep polling.
                    Err(e) => {
                        tracing::debug!(tx_hash = %tx_hash, error = %e, "Receipt query failed");
                        continue;
                    }
                };

                if !receipt.status() {
                    return ConfirmationStatus::Failed {
                        tx_hash,
                        reason: "Transaction reverted".to_string(),
                    };
                }

                let current_block = match self.client.get_block_number().await {
                    Ok(block) => block,
                    Err(e) => {
                        tracing::debug!(tx_hash = %tx_hash, error = %e, "Block number query failed");
                        continue;
                    }
                };
                let tx_block = receipt.block_number.unwrap_or(current_block);
                // The inclusion block counts as the first confirmation.
                let confirmations = current_block.saturating_sub(tx_block) as u32 + 1;

                if confirmations >= required_confirmations {
                    for log in receipt.inner.logs() {
                        if let Ok(decoded) = log.log_decode::<Pong>() {
                            tracing::debug!(
                                tx_hash = %tx_hash,
                                answered = %decoded.inner.data.txHash,
                                "Pong event emitted"
                            );
                        }
                    }
                    return ConfirmationStatus::Confirmed {
                        tx_hash,
                        block_number: tx_block,
                    };
                }

                tracing::debug!(
                    tx_hash = %tx_hash,
                    confirmations = confirmations,
                    required = required_confirmations,
                    "Waiting for confirmations"
                );
            }
        })
        .await;

        result.map_err(|_| BlockchainError::ConfirmationTimeout {
            tx_hash,
            waited_secs: self.config.confirmation_timeout_secs,
        })
    }

    /// Get the wallet address.
    pub fn address(&self) -> Address {
        self.wallet.address()
    }
}

#[async_trait]
impl ReactionSubmitter for ChainSubmitter {
    async fn submit(&self, target: B256) -> BlockchainResult<TxHash> {
        let tx = self.build(target).await?;
        let send = timeout(self.client.endpoints().timeout, self.sender.send_transaction(tx)).await;

        match send {
            Ok(Ok(pending)) => Ok(*pending.tx_hash()),
            Ok(Err(e)) => {
                self.wallet.reset_nonce();
                Err(BlockchainError::Rpc(format!("Failed to send pong: {}", e)))
            }
            Err(_) => {
                // The node may or may not have accepted it; re-sync before the next send.
                self.wallet.reset_nonce();
                Err(BlockchainError::Timeout(self.client.endpoints().timeout.as_secs()))
            }
        }
    }

    async fn await_confirmation(&self, tx_hash: TxHash) -> BlockchainResult<ConfirmationStatus> {
        self.wait_for_confirmation(tx_hash).await
    }
}

impl std::fmt::Debug for ChainSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainSubmitter")
            .field("client", &self.client)
            .field("contract", &self.contract)
            .field("address", &self.wallet.address())
            .finish()
    }
}
