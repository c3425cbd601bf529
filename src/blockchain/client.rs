//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to JSON-RPC endpoints (primary + failovers)
//! - Query chain state (block number, gas price, nonce, receipts)
//! - Handle timeouts and network errors gracefully
//! - Provide the liveness probe used by the supervisor and health reporter

use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionReceipt;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::ledger::LedgerQuery;
use crate::blockchain::types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainId};
use crate::config::ObservationConfig;
use crate::observability::metrics;

/// Endpoint set for one RPC channel.
#[derive(Debug, Clone)]
pub struct RpcEndpoints {
    /// Channel name used in logs and metrics ("observation", "submission").
    pub role: &'static str,
    /// Primary JSON-RPC URL.
    pub primary: String,
    /// Failover JSON-RPC URLs, tried in order.
    pub failovers: Vec<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl From<&ObservationConfig> for RpcEndpoints {
    fn from(config: &ObservationConfig) -> Self {
        Self {
            role: "observation",
            primary: config.rpc_url.clone(),
            failovers: config.failover_urls.clone(),
            timeout: Duration::from_secs(config.rpc_timeout_secs),
        }
    }
}

impl From<&BlockchainConfig> for RpcEndpoints {
    fn from(config: &BlockchainConfig) -> Self {
        Self {
            role: "submission",
            primary: config.rpc_url.clone(),
            failovers: config.failover_urls.clone(),
            timeout: Duration::from_secs(config.rpc_timeout_secs),
        }
    }
}

/// Blockchain RPC client wrapper with failover support.
#[derive(Clone)]
pub struct BlockchainClient {
    /// List of providers (primary + failovers).
    providers: Vec<Arc<dyn Provider + Send + Sync>>,
    /// Endpoint configuration.
    endpoints: RpcEndpoints,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// Only the primary URL is mandatory; unparsable failovers are skipped.
    /// No request is made here, so an unreachable node does not fail construction.
    pub fn new(endpoints: RpcEndpoints) -> BlockchainResult<Self> {
        let mut providers = Vec::new();

        // 1. Add primary provider
        let primary_url: url::Url = endpoints.primary.parse().map_err(|e| {
            BlockchainError::Config(format!("Invalid RPC URL '{}': {}", endpoints.primary, e))
        })?;
        providers.push(Arc::new(ProviderBuilder::new().connect_http(primary_url)) as Arc<dyn Provider + Send + Sync>);

        // 2. Add failover providers
        for url_str in &endpoints.failovers {
            if let Ok(url) = url_str.parse() {
                providers.push(Arc::new(ProviderBuilder::new().connect_http(url)) as Arc<dyn Provider + Send + Sync>);
            } else {
                tracing::warn!(role = endpoints.role, url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        tracing::info!(
            role = endpoints.role,
            rpc_url = %endpoints.primary,
            failovers = providers.len() - 1,
            "Blockchain client initialized"
        );

        Ok(Self { providers, endpoints })
    }

    fn timeout_secs(&self) -> u64 {
        self.endpoints.timeout.as_secs()
    }

    /// Verify the connected chain ID matches the expected one.
    pub async fn verify_chain_id(&self, expected: u64) -> BlockchainResult<()> {
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != expected {
            return Err(BlockchainError::ChainMismatch {
                expected,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_chain_id();
            match timeout(self.endpoints.timeout, fut).await {
                Ok(Ok(result)) => return Ok(ChainId(result)),
                Ok(Err(e)) => {
                    tracing::warn!(role = self.endpoints.role, provider_idx = i, error = %e, "RPC error, trying next provider");
                }
                Err(_) => {
                    tracing::warn!(role = self.endpoints.role, provider_idx = i, "RPC timeout, trying next provider");
                }
            }
        }
        Err(BlockchainError::Rpc("All RPC providers failed".to_string()))
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        let mut timed_out = false;
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_block_number();
            match timeout(self.endpoints.timeout, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(role = self.endpoints.role, provider_idx = i, error = %e, "RPC error"),
                Err(_) => {
                    timed_out = true;
                    tracing::warn!(role = self.endpoints.role, provider_idx = i, "RPC timeout");
                }
            }
        }
        if timed_out && self.providers.len() == 1 {
            return Err(BlockchainError::Timeout(self.timeout_secs()));
        }
        Err(BlockchainError::Rpc("All providers failed to get block number".to_string()))
    }

    /// Get the pending transaction count (next nonce) for an address.
    pub async fn get_pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_count(address).pending();
            match timeout(self.endpoints.timeout, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(role = self.endpoints.role, provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(role = self.endpoints.role, provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get transaction count".to_string()))
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> BlockchainResult<Option<TransactionReceipt>> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_transaction_receipt(tx_hash);
            match timeout(self.endpoints.timeout, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(role = self.endpoints.role, provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(role = self.endpoints.role, provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get receipt".to_string()))
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        for (i, provider) in self.providers.iter().enumerate() {
            let fut = provider.get_gas_price();
            match timeout(self.endpoints.timeout, fut).await {
                Ok(Ok(result)) => return Ok(result),
                Ok(Err(e)) => tracing::warn!(role = self.endpoints.role, provider_idx = i, error = %e, "RPC error"),
                Err(_) => tracing::warn!(role = self.endpoints.role, provider_idx = i, "RPC timeout"),
            }
        }
        Err(BlockchainError::Rpc("All providers failed to get gas price".to_string()))
    }

    /// Get the endpoint configuration.
    pub fn endpoints(&self) -> &RpcEndpoints {
        &self.endpoints
    }
}

#[async_trait]
impl LedgerQuery for BlockchainClient {
    async fn block_number(&self) -> BlockchainResult<u64> {
        let result = self.get_block_number().await;
        metrics::record_rpc_health(self.endpoints.role, result.is_ok());
        result
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("role", &self.endpoints.role)
            .field("rpc_url", &self.endpoints.primary)
            .field("providers", &self.providers.len())
            .field("timeout_secs", &self.timeout_secs())
            .finish()
    }
}
