//! Transactions, connection history and body framing.
//!
//! # Responsibilities
//! - Hold what the parser reconstructed for one request/response pair
//! - Keep the transaction history of a connection, plus endpoint metadata
//! - Decide where a message body ends once its headers are known
//!
//! # Design Decisions
//! - Both directions use the same [`Message`] slots; only the tokenized start
//!   line differs
//! - Transaction flags are raised through [`Transaction::raise`], which
//!   reports whether the flag is new. That is the only deduplication point
//! - Body bytes are counted, never stored or decoded

use std::net::IpAddr;
use std::time::SystemTime;

use serde::Serialize;

use crate::connection::direction::Direction;
use crate::connection::state::{ConnectionStatus, State};
use crate::http::flags::{Anomaly, TxFlags};
use crate::http::headers::HeaderTable;
use crate::http::lines::HeaderLine;
use crate::http::protocol::Method;
use crate::http::serialize_lossy;
use crate::http::tokenizer::{RequestLine, ResponseLine};

/// One direction of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// The start line as received, without terminator.
    #[serde(serialize_with = "serialize_lossy")]
    pub line: Vec<u8>,
    /// Every header line in arrival order, raw.
    pub header_lines: Vec<HeaderLine>,
    pub headers: HeaderTable,
    pub body_len: u64,
    pub progress: State,
}

impl Default for Message {
    fn default() -> Self {
        Self {
            line: Vec::new(),
            header_lines: Vec::new(),
            headers: HeaderTable::new(),
            body_len: 0,
            progress: State::Idle,
        }
    }
}

/// A 1xx response that preceded the final response of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterimResponse {
    pub line: ResponseLine,
    pub message: Message,
}

/// A request/response pair.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Transaction {
    pub index: usize,
    pub request: Message,
    pub response: Message,
    pub request_line: Option<RequestLine>,
    pub response_line: Option<ResponseLine>,
    /// Interim responses in arrival order, e.g. `100 Continue`.
    pub interim_responses: Vec<InterimResponse>,
    pub flags: TxFlags,
}

impl Transaction {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn message(&self, direction: Direction) -> &Message {
        match direction {
            Direction::Request => &self.request,
            Direction::Response => &self.response,
        }
    }

    pub fn message_mut(&mut self, direction: Direction) -> &mut Message {
        match direction {
            Direction::Request => &mut self.request,
            Direction::Response => &mut self.response,
        }
    }

    /// Raise the transaction flag for `anomaly`. Returns true only the first
    /// time the flag is set.
    pub fn raise(&mut self, anomaly: Anomaly) -> bool {
        let flag = anomaly.tx_flag();
        let fresh = !self.flags.contains(flag);
        self.flags |= flag;
        fresh
    }

    pub fn request_method(&self) -> Method {
        self.request_line
            .as_ref()
            .map(|line| line.method_number)
            .unwrap_or_default()
    }

    pub fn response_status_number(&self) -> Option<u16> {
        self.response_line.as_ref().and_then(|line| line.status_number)
    }

    /// True when the current response is an interim one that the final
    /// response will follow. `101` switches protocols and is final.
    pub fn has_interim_response(&self) -> bool {
        self.response_status_number()
            .is_some_and(|s| (100..200).contains(&s) && s != 101)
    }

    /// Move the current response into the interim list, leaving the
    /// response slots empty for the final response.
    pub fn shelve_interim_response(&mut self) {
        let mut message = std::mem::take(&mut self.response);
        message.progress = State::Done;
        if let Some(line) = self.response_line.take() {
            self.interim_responses.push(InterimResponse { line, message });
        }
    }

    /// True when both directions reached `DONE`.
    pub fn is_complete(&self) -> bool {
        self.request.progress == State::Done && self.response.progress == State::Done
    }
}

/// Endpoint metadata and transaction history of one connection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Connection {
    pub remote_addr: Option<IpAddr>,
    pub remote_port: Option<u16>,
    pub local_addr: Option<IpAddr>,
    pub local_port: Option<u16>,
    pub status: ConnectionStatus,
    pub opened_at: Option<SystemTime>,
    pub closed_at: Option<SystemTime>,
    pub transactions: Vec<Transaction>,
}

impl Connection {
    pub fn transaction(&self, index: usize) -> Option<&Transaction> {
        self.transactions.get(index)
    }

    pub fn transaction_mut(&mut self, index: usize) -> Option<&mut Transaction> {
        self.transactions.get_mut(index)
    }

    /// Get the transaction at `index`, creating it and any gap before it.
    ///
    /// Either direction may arrive first, so whichever reaches an index
    /// first creates the transaction.
    pub fn transaction_or_create(&mut self, index: usize) -> &mut Transaction {
        while self.transactions.len() <= index {
            let next = self.transactions.len();
            self.transactions.push(Transaction::new(next));
        }
        &mut self.transactions[index]
    }
}

/// How the end of a message body is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFraming {
    /// No body follows the headers.
    None,
    /// This many body bytes remain.
    Length(u64),
    /// The body runs until the connection closes.
    UntilClose,
}

/// Decide the body framing of `direction` in `tx`, whose headers are final.
///
/// Returns the anomaly to raise when the framing headers are unusable.
pub fn body_framing(tx: &Transaction, direction: Direction) -> (BodyFraming, Option<Anomaly>) {
    let headers = &tx.message(direction).headers;

    if direction == Direction::Response {
        let bodiless_status = tx
            .response_status_number()
            .is_some_and(|s| (100..200).contains(&s) || s == 204 || s == 304);
        if bodiless_status || tx.request_method() == Method::Head {
            return (BodyFraming::None, None);
        }
    }

    // Transfer codings are not decoded; such a body lasts until close.
    if headers.contains("transfer-encoding") {
        return (BodyFraming::UntilClose, None);
    }

    let fallback = match direction {
        Direction::Request => BodyFraming::None,
        Direction::Response => BodyFraming::UntilClose,
    };

    match headers.get("content-length") {
        Some(field) => match parse_content_length(&field.value) {
            Some(0) => (BodyFraming::None, None),
            Some(len) => (BodyFraming::Length(len), None),
            None => (fallback, Some(Anomaly::InvalidContentLength)),
        },
        None => (fallback, None),
    }
}

/// Strict decimal Content-Length. A combined repeated header never parses.
fn parse_content_length(value: &[u8]) -> Option<u64> {
    if value.is_empty() || !value.iter().all(u8::is_ascii_digit) {
        return None;
    }
    value.iter().try_fold(0u64, |acc, d| {
        acc.checked_mul(10)?.checked_add(u64::from(d - b'0'))
    })
}
