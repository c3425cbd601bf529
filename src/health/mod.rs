//! Periodic health reporting.
//!
//! # Data Flow
//! ```text
//! interval tick
//!     → LedgerQuery::block_number
//!     → LivenessSample { block_height, timestamp }
//!     → log + Notifier::notify
//! ```
//!
//! # Design Decisions
//! - Independent of the supervisor: reports chain reachability, not
//!   subscription health (the current supervisor state is only appended)
//! - A failed sample is logged and skipped

pub mod reporter;

pub use reporter::{HealthReporter, LivenessSample};
