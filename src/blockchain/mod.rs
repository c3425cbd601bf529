//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Environment Variables (private key)
//!     → wallet.rs (key loading, signing, local nonce)
//!     → client.rs (HTTP RPC with timeouts and failover; ledger probe)
//!     → contract.rs (Ping/Pong ABI)
//!     → transaction.rs (build, sign, broadcast, confirm pong)
//! ```
//!
//! # Security Constraints
//! - Private keys ONLY from environment variables
//! - Never log private keys or sensitive data
//! - All RPC calls have configurable timeouts
//! - Graceful degradation when blockchain unreachable

pub mod client;
pub mod contract;
pub mod ledger;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::{BlockchainClient, RpcEndpoints};
pub use ledger::LedgerQuery;
pub use transaction::ChainSubmitter;
pub use types::{BlockchainConfig, BlockchainError, BlockchainResult, ChainId, ConfirmationStatus};
pub use wallet::Wallet;
