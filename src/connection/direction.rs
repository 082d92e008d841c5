//! Directions and the per-direction parse state.
//!
//! The request and response parsers share every component; what differs is
//! captured by [`Direction`]: which start line grammar applies and which
//! transaction slots receive the output.

use std::fmt;

use serde::Serialize;

use crate::connection::state::State;
use crate::connection::transaction::BodyFraming;
use crate::error::Result;
use crate::http::buffer::LineBuffer;

/// Stream direction relative to the connection originator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Client to server.
    Request,
    /// Server to client.
    Response,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Request => "request",
            Direction::Response => "response",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything one direction needs to resume parsing on the next chunk.
#[derive(Debug)]
pub struct DirectionalState {
    pub(crate) direction: Direction,
    pub(crate) state: State,
    /// The line being assembled. It is owned here until committed to the
    /// transaction's line store.
    pub(crate) buffer: LineBuffer,
    /// First line of the header field under construction.
    pub(crate) header_line_index: Option<usize>,
    /// Header lines committed for the current message.
    pub(crate) header_line_counter: usize,
    /// Transaction this direction is working on.
    pub(crate) tx_index: usize,
    pub(crate) body: BodyFraming,
}

impl DirectionalState {
    pub(crate) fn new(direction: Direction, field_limit_hard: usize) -> Result<Self> {
        Ok(Self {
            direction,
            state: State::Idle,
            buffer: LineBuffer::with_limit(field_limit_hard)?,
            header_line_index: None,
            header_line_counter: 0,
            tx_index: 0,
            body: BodyFraming::None,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn header_line_index(&self) -> Option<usize> {
        self.header_line_index
    }

    pub fn header_line_counter(&self) -> usize {
        self.header_line_counter
    }

    pub fn buffer(&self) -> &LineBuffer {
        &self.buffer
    }

    /// Forget per-message progress before the next message starts.
    pub(crate) fn reset_message(&mut self) {
        self.buffer.reset();
        self.header_line_index = None;
        self.header_line_counter = 0;
        self.body = BodyFraming::None;
    }

    /// Release the line buffer and any partial line it holds.
    pub(crate) fn release(&mut self) {
        self.buffer.release();
        self.header_line_index = None;
    }
}
