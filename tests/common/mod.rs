//! Shared utilities for integration tests.

use http_normalizer::config::ParserConfig;
use http_normalizer::connection::{ConnectionParser, Direction, State};
use http_normalizer::Result;

/// A parser with default configuration.
pub fn parser() -> ConnectionParser {
    ConnectionParser::create(&ParserConfig::default()).unwrap()
}

/// A parser with the given hard and soft field limits.
#[allow(dead_code)]
pub fn parser_with_limits(hard: usize, soft: usize) -> ConnectionParser {
    let config = ParserConfig {
        field_limit_hard: hard,
        field_limit_soft: soft,
        ..Default::default()
    };
    ConnectionParser::create(&config).unwrap()
}

/// Feed `data` in pieces of `chunk` bytes, returning the state after the
/// last piece.
#[allow(dead_code)]
pub fn feed_chunked(
    parser: &mut ConnectionParser,
    direction: Direction,
    data: &[u8],
    chunk: usize,
) -> Result<State> {
    let mut state = parser.side(direction).state();
    for piece in data.chunks(chunk) {
        state = parser.feed(direction, piece)?;
    }
    Ok(state)
}

/// A simple keep-alive exchange used by several tests.
#[allow(dead_code)]
pub const REQUEST: &[u8] = b"POST /submit HTTP/1.1\r\n\
Host: example.com\r\n\
Content-Length: 5\r\n\
\r\n\
hello\
GET /next HTTP/1.1\r\n\
Host: example.com\r\n\
\r\n";

#[allow(dead_code)]
pub const RESPONSE: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: text/plain\r\n\
Content-Length: 2\r\n\
\r\n\
ok\
HTTP/1.1 404 Not Found\r\n\
Content-Length: 0\r\n\
\r\n";
