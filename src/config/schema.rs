//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the agent.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the pong agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Watched contract and event.
    pub contract: ContractConfig,

    /// Observation channel (event feed + liveness queries).
    pub observation: ObservationConfig,

    /// Submission channel (signed pong transactions).
    pub submission: BlockchainConfig,

    /// Duplicate-reaction gate settings.
    pub reactions: ReactionConfig,

    /// Connection supervision timers.
    pub supervisor: SupervisorConfig,

    /// Periodic health report settings.
    pub health: HealthConfig,

    /// Telegram notification channel.
    pub telegram: TelegramConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Contract being watched and reacted to.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Address of the ping/pong contract.
    pub address: String,

    /// Solidity signature of the watched event.
    pub event_signature: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            address: "0xA7F42ff7433cB268dD7D59be62b00c30dEd28d3D".to_string(),
            event_signature: "Ping()".to_string(),
        }
    }
}

/// Observation channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservationConfig {
    /// WebSocket endpoint used for the log subscription.
    pub ws_url: String,

    /// JSON-RPC endpoint used for liveness probes and health sampling.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoints for liveness queries.
    pub failover_urls: Vec<String>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Timeout for establishing the WebSocket subscription in seconds.
    pub connect_timeout_secs: u64,

    /// Capacity of the notice channel between the feed and the supervisor.
    pub buffer_size: usize,
}

impl Default for ObservationConfig {
    fn default() -> Self {
        Self {
            ws_url: "wss://sepolia.gateway.tenderly.co".to_string(),
            rpc_url: "https://ethereum-sepolia-rpc.publicnode.com".to_string(),
            failover_urls: Vec::new(),
            rpc_timeout_secs: 10,
            connect_timeout_secs: 15,
            buffer_size: 256,
        }
    }
}

/// Submission channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Failover JSON-RPC endpoint URLs (reads only; sends go to `rpc_url`).
    #[serde(default)]
    pub failover_urls: Vec<String>,

    /// Chain ID (e.g., 1 for Ethereum mainnet, 11155111 for Sepolia).
    pub chain_id: u64,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Number of block confirmations required for finality.
    pub confirmation_blocks: u32,

    /// Maximum time to wait for a pong to confirm, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Receipt polling interval in milliseconds.
    pub receipt_poll_ms: u64,

    /// Gas price multiplier (1.0 = estimated, 1.2 = 20% buffer).
    pub gas_price_multiplier: f64,

    /// Maximum gas price in gwei (protection against spikes).
    pub max_gas_price_gwei: u64,

    /// Gas limit for a pong call.
    pub gas_limit: u64,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "https://ethereum-sepolia.blockpi.network/v1/rpc/public".to_string(),
            failover_urls: Vec::new(),
            chain_id: 11_155_111,
            rpc_timeout_secs: 10,
            confirmation_blocks: 1,
            confirmation_timeout_secs: 300,
            receipt_poll_ms: 2000,
            gas_price_multiplier: 1.2,
            max_gas_price_gwei: 500,
            gas_limit: 100_000,
        }
    }
}

/// Duplicate-reaction gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReactionConfig {
    /// How long a trigger is remembered after its reaction settles, in seconds.
    pub retention_secs: u64,
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            retention_secs: 3600,
        }
    }
}

/// Retry delay policy between connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackoffKind {
    /// Same delay before every attempt.
    #[default]
    Fixed,
    /// Doubling delay with jitter, capped at `max_delay_ms`.
    Exponential,
}

/// Connection supervision configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Delay between connection attempts in milliseconds.
    pub retry_delay_ms: u64,

    /// Retry delay policy.
    pub backoff: BackoffKind,

    /// Upper bound for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Proactive subscription rotation interval in seconds.
    pub rotation_interval_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: 3000,
            backoff: BackoffKind::Fixed,
            max_delay_ms: 60_000,
            rotation_interval_secs: 15 * 60,
        }
    }
}

/// Health report configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Enable periodic health reports.
    pub enabled: bool,

    /// Report interval in seconds.
    pub interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5 * 60,
        }
    }
}

/// Telegram notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Enable Telegram delivery. When disabled, notifications are only logged.
    pub enabled: bool,

    /// Bot API token obtained from BotFather.
    pub bot_token: String,

    /// Target chat ID for notifications.
    pub chat_id: String,

    /// Bot API base URL.
    pub api_base: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
