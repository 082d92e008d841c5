//! Protocol, status and method number parsing.
//!
//! These never fail: a token that cannot be interpreted maps to an unknown
//! sentinel, and it is up to the caller to decide whether that is an anomaly.

use serde::{Deserialize, Serialize};

/// Normalized HTTP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HttpProtocol {
    #[default]
    Unknown,
    V0_9,
    V1_0,
    V1_1,
}

impl HttpProtocol {
    /// Numeric form: 9, 100, 101, or -1 when unknown.
    pub fn number(self) -> i32 {
        match self {
            HttpProtocol::Unknown => -1,
            HttpProtocol::V0_9 => 9,
            HttpProtocol::V1_0 => 100,
            HttpProtocol::V1_1 => 101,
        }
    }
}

/// Parse a protocol token such as `HTTP/1.1`.
pub fn parse_protocol(token: &[u8]) -> HttpProtocol {
    match token {
        b"HTTP/0.9" => HttpProtocol::V0_9,
        b"HTTP/1.0" => HttpProtocol::V1_0,
        b"HTTP/1.1" => HttpProtocol::V1_1,
        _ => HttpProtocol::Unknown,
    }
}

/// Parse a three digit status code. `None` is the unknown sentinel.
pub fn parse_status(token: &[u8]) -> Option<u16> {
    if token.len() != 3 || !token.iter().all(u8::is_ascii_digit) {
        return None;
    }

    let status = token
        .iter()
        .fold(0u16, |acc, d| acc * 10 + u16::from(d - b'0'));
    (100..=999).contains(&status).then_some(status)
}

/// Normalized request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Method {
    #[default]
    Unknown,
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

/// Parse a method token. Matching is case-sensitive.
pub fn parse_method(token: &[u8]) -> Method {
    match token {
        b"GET" => Method::Get,
        b"HEAD" => Method::Head,
        b"POST" => Method::Post,
        b"PUT" => Method::Put,
        b"DELETE" => Method::Delete,
        b"CONNECT" => Method::Connect,
        b"OPTIONS" => Method::Options,
        b"TRACE" => Method::Trace,
        b"PATCH" => Method::Patch,
        _ => Method::Unknown,
    }
}
