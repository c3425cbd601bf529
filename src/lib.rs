//! Ping/pong reactive agent library.
//!
//! Watches a contract for `Ping()` events over a WebSocket subscription and
//! answers each one with a `pong(bytes32)` transaction.

// Event observation
pub mod feed;
pub mod supervisor;

// Reaction
pub mod blockchain;
pub mod responder;

// Cross-cutting concerns
pub mod config;
pub mod health;
pub mod lifecycle;
pub mod notify;
pub mod observability;
pub mod resilience;

pub use config::AgentConfig;
pub use lifecycle::{Agent, AgentError, Shutdown};
