//! Connection supervisor.
//!
//! # Data Flow
//! ```text
//! Connecting: LedgerQuery::block_number (probe) → SubscriptionManager::open
//!     → failed? wait RetryPolicy::delay → Connecting
//! Live: Subscription::next
//!     → Notice → Responder::spawn (never awaited)
//!     → Terminated → Failed → close old, open new
//!     → rotation tick → Rotating → close old, open new
//! ```
//!
//! # Design Decisions
//! - Owns at most one subscription; replacement always closes first
//! - No terminal state: the loop ends only on shutdown
//! - State is published on a watch channel for the health reporter

pub mod runner;
pub mod state;

pub use runner::{Supervisor, SupervisorSettings, ROTATION_MESSAGE};
pub use state::SupervisorState;
