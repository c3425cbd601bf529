//! Resilience subsystem.
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every RPC call has a deadline (see `blockchain::client`)
//! - Connection attempts retry forever; backoff.rs only decides the pacing
//! - Reactions are never retried (a duplicate pong is worse than a missed one)

pub mod backoff;

pub use backoff::RetryPolicy;
