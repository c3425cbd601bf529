//! Supervisor state machine.
//!
//! # State Transitions
//! ```text
//! Idle → Connecting: process start
//! Connecting → Connecting: probe or subscribe failed, after the retry delay
//! Connecting → Live: probe succeeded and the subscription is live
//! Live → Failed: subscription emitted its terminal signal
//! Live → Rotating: rotation timer fired
//! Failed | Rotating → Connecting: close old subscription, open a new one
//! any → Idle: shutdown
//! ```

/// Where the supervisor is in its connect/rotate/reconnect cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupervisorState {
    Idle,
    Connecting,
    Live,
    Failed,
    Rotating,
}

impl SupervisorState {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_transition_to(self, next: SupervisorState) -> bool {
        use SupervisorState::*;
        matches!(
            (self, next),
            (Idle, Connecting)
                | (Connecting, Connecting)
                | (Connecting, Live)
                | (Live, Failed)
                | (Live, Rotating)
                | (Failed, Connecting)
                | (Rotating, Connecting)
                | (_, Idle)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Connecting => "connecting",
            SupervisorState::Live => "live",
            SupervisorState::Failed => "failed",
            SupervisorState::Rotating => "rotating",
        }
    }
}

impl std::fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
