//! Start line and header field tokenization.
//!
//! # Responsibilities
//! - Split request and status lines into their three fields
//! - Split a (possibly reassembled) header field into name and value
//! - Report every anomaly met along the way
//!
//! # Design Decisions
//! - Pure functions over byte slices; anomalies are pushed into a caller
//!   supplied list so the caller decides how to flag and log them
//! - Malformed input is characterized, not rejected. The only failures are a
//!   header line without a colon and an empty start line
//! - All output is copied out of the input, which belongs to a buffer that
//!   gets recycled

use memchr::memchr;
use serde::Serialize;

use crate::error::{NormalizerError, Result};
use crate::http::classify::{is_lws, is_space, is_token};
use crate::http::flags::Anomaly;
use crate::http::headers::HeaderField;
use crate::http::protocol::{
    parse_method, parse_protocol, parse_status, HttpProtocol, Method,
};
use crate::http::serialize_lossy;

/// The three whitespace separated parts of a start line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartLine<'a> {
    pub first: &'a [u8],
    pub second: &'a [u8],
    /// Everything after the second separator run, verbatim.
    pub rest: &'a [u8],
}

/// Split a start line.
///
/// Leading whitespace is not skipped: a line starting with a space has an
/// empty first field. The third field keeps any embedded whitespace.
pub fn split_start_line(line: &[u8]) -> Result<StartLine<'_>> {
    if line.is_empty() {
        return Err(NormalizerError::EmptyLine);
    }

    let len = line.len();
    let mut pos = 0;

    while pos < len && !is_space(line[pos]) {
        pos += 1;
    }
    let first = &line[..pos];

    while pos < len && is_space(line[pos]) {
        pos += 1;
    }

    let start = pos;
    while pos < len && !is_space(line[pos]) {
        pos += 1;
    }
    let second = &line[start..pos];

    while pos < len && is_space(line[pos]) {
        pos += 1;
    }

    Ok(StartLine {
        first,
        second,
        rest: &line[pos..],
    })
}

/// A tokenized status line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ResponseLine {
    #[serde(serialize_with = "serialize_lossy")]
    pub protocol: Vec<u8>,
    pub protocol_number: HttpProtocol,
    #[serde(serialize_with = "serialize_lossy")]
    pub status: Vec<u8>,
    /// `None` when the status token is not a number in `100..=999`.
    pub status_number: Option<u16>,
    #[serde(serialize_with = "serialize_lossy")]
    pub message: Vec<u8>,
}

/// Tokenize `PROTOCOL STATUS MESSAGE`.
pub fn parse_response_line(line: &[u8], anomalies: &mut Vec<Anomaly>) -> Result<ResponseLine> {
    let parts = split_start_line(line)?;

    let status_number = parse_status(parts.second);
    if status_number.is_none() {
        anomalies.push(Anomaly::InvalidStatusLine);
    }

    Ok(ResponseLine {
        protocol: parts.first.to_vec(),
        protocol_number: parse_protocol(parts.first),
        status: parts.second.to_vec(),
        status_number,
        message: parts.rest.to_vec(),
    })
}

/// A tokenized request line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RequestLine {
    #[serde(serialize_with = "serialize_lossy")]
    pub method: Vec<u8>,
    pub method_number: Method,
    #[serde(serialize_with = "serialize_lossy")]
    pub uri: Vec<u8>,
    #[serde(serialize_with = "serialize_lossy")]
    pub protocol: Vec<u8>,
    pub protocol_number: HttpProtocol,
}

/// Tokenize `METHOD URI PROTOCOL`. A missing protocol means HTTP/0.9.
///
/// The protocol is everything after the URI, verbatim. Trailing whitespace
/// stays in it, so `GET / HTTP/1.1 ` has an unknown protocol and is flagged.
pub fn parse_request_line(line: &[u8], anomalies: &mut Vec<Anomaly>) -> Result<RequestLine> {
    let parts = split_start_line(line)?;

    let protocol_number = if parts.rest.is_empty() {
        HttpProtocol::V0_9
    } else {
        let protocol = parse_protocol(parts.rest);
        if protocol == HttpProtocol::Unknown {
            anomalies.push(Anomaly::InvalidRequestLine);
        }
        protocol
    };

    Ok(RequestLine {
        method: parts.first.to_vec(),
        method_number: parse_method(parts.first),
        uri: parts.second.to_vec(),
        protocol: parts.rest.to_vec(),
        protocol_number,
    })
}

/// Split one header field into name and value.
///
/// Returns [`NormalizerError::FieldUnparseable`] when there is no colon; the
/// line then contributes no field. Every other problem is recorded on the
/// returned field's flags and pushed onto `anomalies`.
pub fn parse_header(data: &[u8], anomalies: &mut Vec<Anomaly>) -> Result<HeaderField> {
    let Some(colon) = memchr(b':', data) else {
        anomalies.push(Anomaly::MissingColon);
        return Err(NormalizerError::FieldUnparseable);
    };

    let mut field = HeaderField::default();
    let mut raise = |field: &mut HeaderField, anomaly: Anomaly| {
        field.flags |= anomaly.field_flag();
        anomalies.push(anomaly);
    };

    if colon == 0 {
        raise(&mut field, Anomaly::EmptyName);
    }

    // Whitespace between name and colon. The first byte always stays.
    let mut name_end = colon;
    while name_end > 1 && is_lws(data[name_end - 1]) {
        name_end -= 1;
    }
    if name_end < colon {
        raise(&mut field, Anomaly::WhitespaceAfterName);
    }

    let len = data.len();
    let mut value_start = colon + 1;
    while value_start < len && is_lws(data[value_start]) {
        value_start += 1;
    }

    let mut value_end = len;
    while value_end > value_start && is_lws(data[value_end - 1]) {
        value_end -= 1;
    }

    if data[..colon].iter().any(|&c| !is_token(c)) {
        raise(&mut field, Anomaly::NameNotToken);
    }

    field.name = data[..name_end].to_vec();
    field.value = data[value_start..value_end].to_vec();
    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::flags::FieldFlags;

    fn header(data: &str) -> (Result<HeaderField>, Vec<Anomaly>) {
        let mut anomalies = Vec::new();
        let result = parse_header(data.as_bytes(), &mut anomalies);
        (result, anomalies)
    }

    #[test]
    fn test_status_line_single_spaces() {
        let mut anomalies = Vec::new();
        let line = parse_response_line(b"HTTP/1.1 200 OK", &mut anomalies).unwrap();
        assert_eq!(line.protocol, b"HTTP/1.1");
        assert_eq!(line.protocol_number, HttpProtocol::V1_1);
        assert_eq!(line.status, b"200");
        assert_eq!(line.status_number, Some(200));
        assert_eq!(line.message, b"OK");
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_status_line_message_keeps_inner_whitespace() {
        let mut anomalies = Vec::new();
        let line =
            parse_response_line(b"HTTP/1.0 \t 404   Not  \tFound ", &mut anomalies).unwrap();
        assert_eq!(line.status, b"404");
        assert_eq!(line.message, b"Not  \tFound ");
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_status_line_missing_fields() {
        let mut anomalies = Vec::new();
        let line = parse_response_line(b"HTTP/1.1", &mut anomalies).unwrap();
        assert_eq!(line.status, b"");
        assert_eq!(line.message, b"");
        assert_eq!(line.status_number, None);
        assert_eq!(anomalies, vec![Anomaly::InvalidStatusLine]);
    }

    #[test]
    fn test_status_line_leading_space_gives_empty_protocol() {
        let parts = split_start_line(b" 200 OK").unwrap();
        assert_eq!(parts.first, b"");
        assert_eq!(parts.second, b"200");
        assert_eq!(parts.rest, b"OK");
    }

    #[test]
    fn test_empty_start_line_is_an_error() {
        let mut anomalies = Vec::new();
        assert_eq!(
            parse_response_line(b"", &mut anomalies),
            Err(NormalizerError::EmptyLine)
        );
    }

    #[test]
    fn test_request_line() {
        let mut anomalies = Vec::new();
        let line = parse_request_line(b"GET /index.html HTTP/1.1", &mut anomalies).unwrap();
        assert_eq!(line.method_number, Method::Get);
        assert_eq!(line.uri, b"/index.html");
        assert_eq!(line.protocol_number, HttpProtocol::V1_1);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_request_line_http_0_9() {
        let mut anomalies = Vec::new();
        let line = parse_request_line(b"GET /", &mut anomalies).unwrap();
        assert_eq!(line.protocol, b"");
        assert_eq!(line.protocol_number, HttpProtocol::V0_9);
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_request_line_unknown_protocol() {
        let mut anomalies = Vec::new();
        let line = parse_request_line(b"GET / HTTP/1.1 extra", &mut anomalies).unwrap();
        assert_eq!(line.protocol, b"HTTP/1.1 extra");
        assert_eq!(line.protocol_number, HttpProtocol::Unknown);
        assert_eq!(anomalies, vec![Anomaly::InvalidRequestLine]);
    }

    #[test]
    fn test_request_line_trailing_space_kept_in_protocol() {
        let mut anomalies = Vec::new();
        let line = parse_request_line(b"GET / HTTP/1.1 ", &mut anomalies).unwrap();
        assert_eq!(line.protocol, b"HTTP/1.1 ");
        assert_eq!(line.protocol_number, HttpProtocol::Unknown);
        assert_eq!(anomalies, vec![Anomaly::InvalidRequestLine]);
    }

    #[test]
    fn test_header_simple() {
        let (field, anomalies) = header("Content-Type: text/html");
        let field = field.unwrap();
        assert_eq!(field.name, b"Content-Type");
        assert_eq!(field.value, b"text/html");
        assert!(field.flags.is_empty());
        assert!(anomalies.is_empty());
    }

    #[test]
    fn test_header_value_whitespace_trimmed() {
        let (field, _) = header("X: \t a b \t ");
        assert_eq!(field.unwrap().value, b"a b");
    }

    #[test]
    fn test_header_missing_colon() {
        let (field, anomalies) = header("no colon here");
        assert_eq!(field, Err(NormalizerError::FieldUnparseable));
        assert_eq!(anomalies, vec![Anomaly::MissingColon]);
        assert_eq!(anomalies[0].field_flag(), FieldFlags::UNPARSEABLE);
    }

    #[test]
    fn test_header_empty_name() {
        let (field, anomalies) = header(": value");
        let field = field.unwrap();
        assert_eq!(field.name, b"");
        assert_eq!(field.value, b"value");
        assert!(field.flags.contains(FieldFlags::INVALID));
        assert!(anomalies.contains(&Anomaly::EmptyName));
    }

    #[test]
    fn test_header_whitespace_before_colon() {
        let (field, anomalies) = header("Host \t: example.com");
        let field = field.unwrap();
        assert_eq!(field.name, b"Host");
        assert!(field.flags.contains(FieldFlags::INVALID));
        assert_eq!(anomalies[0], Anomaly::WhitespaceAfterName);
    }

    #[test]
    fn test_header_whitespace_only_name_keeps_first_byte() {
        let (field, anomalies) = header(" :x");
        let field = field.unwrap();
        assert_eq!(field.name, b" ");
        assert_eq!(anomalies, vec![Anomaly::NameNotToken]);
    }

    #[test]
    fn test_header_non_token_name_flagged_once() {
        let (field, anomalies) = header("X(a)b: y");
        let field = field.unwrap();
        assert_eq!(field.name, b"X(a)b");
        assert!(field.flags.contains(FieldFlags::INVALID));
        assert_eq!(anomalies, vec![Anomaly::NameNotToken]);
    }

    #[test]
    fn test_header_empty_value() {
        for input in ["X:", "X:   ", "X:\t"] {
            let (field, anomalies) = header(input);
            let field = field.unwrap();
            assert_eq!(field.name, b"X");
            assert_eq!(field.value, b"", "{input:?}");
            assert!(anomalies.is_empty());
        }
    }

    #[test]
    fn test_header_value_may_contain_colons() {
        let (field, _) = header("Location: http://example.com:8080/");
        assert_eq!(field.unwrap().value, b"http://example.com:8080/");
    }

    #[test]
    fn test_header_does_not_alias_input() {
        let mut data = b"A: b".to_vec();
        let mut anomalies = Vec::new();
        let field = parse_header(&data, &mut anomalies).unwrap();
        data.fill(b'z');
        assert_eq!(field.name, b"A");
        assert_eq!(field.value, b"b");
    }
}
