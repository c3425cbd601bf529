//! Event feed subsystem (subscription manager).
//!
//! # Data Flow
//! ```text
//! EventSource::subscribe(filter)        (ws.rs: alloy WsConnect + subscribe_logs)
//!     → RawLogStream
//!     → subscription.rs pump task (skip reorged logs, Log → EventNotice)
//!     → bounded mpsc
//!     → Subscription::next() → FeedMessage::{Notice, Terminated}
//! ```
//!
//! # Design Decisions
//! - One terminal signal per subscription; transport errors never escape
//!   as `Err` past this module
//! - A subscription is never restarted; the supervisor opens a new one

pub mod source;
pub mod subscription;
pub mod types;
pub mod ws;

pub use source::{EventSource, RawLogStream};
pub use subscription::{Subscription, SubscriptionId, SubscriptionManager};
pub use types::{EventFilter, EventNotice, FeedError, FeedMessage, SubscriptionStatus, Termination};
pub use ws::WsEventSource;
