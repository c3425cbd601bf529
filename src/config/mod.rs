//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! pong-bot.toml (path from PONG_BOT_CONFIG)
//!     → loader.rs (parse & deserialize, env overrides)
//!     → validation.rs (semantic checks)
//!     → AgentConfig (validated, immutable)
//!     → cloned into each subsystem at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    AgentConfig, BackoffKind, BlockchainConfig, ContractConfig, HealthConfig,
    ObservabilityConfig, ObservationConfig, ReactionConfig, SupervisorConfig, TelegramConfig,
};
