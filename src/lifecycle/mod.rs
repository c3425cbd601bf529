//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → wallet, RPC clients, feed → responder → supervisor + health reporter
//!     Agent failure → wait retry delay → relaunch
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → supervisor closes its subscription → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then chain clients, then tasks
//! - A failed launch is retried forever; only shutdown ends the process

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run_forever, Agent, AgentError};
