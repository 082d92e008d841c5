//! Errors surfaced by the parsing engine.
//!
//! Only structural conditions become errors. Malformed but decodable input is
//! reported through flags and diagnostic log entries instead, see
//! [`crate::http::flags`].

use thiserror::Error;

use crate::connection::Direction;

/// Errors that abort parsing of a message, or reject an operation outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizerError {
    /// A line grew past the configured hard field limit.
    #[error("line of {attempted} bytes exceeds hard field limit of {limit} bytes")]
    BufferLimitExceeded { limit: usize, attempted: usize },

    /// A buffer allocation failed.
    #[error("failed to allocate {0} bytes")]
    OutOfMemory(usize),

    /// A header line had no colon and was dropped.
    #[error("header field is missing a colon")]
    FieldUnparseable,

    /// A start line was empty.
    #[error("start line is empty")]
    EmptyLine,

    /// The direction already hit a fatal error and no longer accepts data.
    #[error("{0} stream is in the error state")]
    StreamFailed(Direction),

    /// The parser was destroyed and no longer owns any buffers.
    #[error("connection parser has been destroyed")]
    Destroyed,
}

impl NormalizerError {
    /// Short, stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            NormalizerError::BufferLimitExceeded { .. } => "buffer_limit_exceeded",
            NormalizerError::OutOfMemory(_) => "out_of_memory",
            NormalizerError::FieldUnparseable => "field_unparseable",
            NormalizerError::EmptyLine => "empty_line",
            NormalizerError::StreamFailed(_) => "stream_failed",
            NormalizerError::Destroyed => "destroyed",
        }
    }
}

/// Result type for parsing operations.
pub type Result<T> = std::result::Result<T, NormalizerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NormalizerError::BufferLimitExceeded {
            limit: 16,
            attempted: 20,
        };
        assert_eq!(
            err.to_string(),
            "line of 20 bytes exceeds hard field limit of 16 bytes"
        );

        let err = NormalizerError::StreamFailed(Direction::Response);
        assert_eq!(err.to_string(), "response stream is in the error state");
        assert_eq!(err.kind(), "stream_failed");
    }
}
