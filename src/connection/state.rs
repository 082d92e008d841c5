//! Parser state machine states.
//!
//! ```text
//! IDLE ──bytes──▶ LINE ──start line──▶ HEADERS ──blank line──▶ BODY ──▶ DONE
//!   ▲                                                                   │
//!   └──────────────────────── next message ─────────────────────────────┘
//!
//! any state ──fatal──▶ ERROR (absorbing)
//! ```

use serde::Serialize;

/// Per-direction parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    /// Waiting for the first byte of a message.
    Idle,
    /// Accumulating the start line.
    Line,
    /// Accumulating header lines.
    Headers,
    /// Consuming the message body.
    Body,
    /// The message is complete.
    Done,
    /// A fatal error stopped this direction.
    Error,
}

impl State {
    pub fn is_terminal(self) -> bool {
        matches!(self, State::Done | State::Error)
    }
}

/// Connection lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    New,
    Open,
    Closed,
}
