//! Connection parser: lifecycle and the per-direction feed loop.
//!
//! # Responsibilities
//! - Own both directional states, the connection history and the
//!   diagnostic log
//! - Drive bytes through line buffer → line store → tokenizer → header table
//! - Turn anomalies into deduplicated transaction flags and log entries
//!
//! # Design Decisions
//! - The configuration is copied at creation and never shared
//! - One loop serves both directions; the direction only selects the start
//!   line grammar and the transaction slots
//! - Only structural problems (hard limit, allocation, misuse) return
//!   errors. Everything else is flagged and parsing continues

use std::any::Any;
use std::net::IpAddr;
use std::ops::Range;
use std::time::SystemTime;

use memchr::memchr;

use crate::config::ParserConfig;
use crate::connection::direction::{Direction, DirectionalState};
use crate::connection::log::{DiagnosticLog, Location, LogEntry, Severity};
use crate::connection::state::{ConnectionStatus, State};
use crate::connection::transaction::{body_framing, BodyFraming, Connection, Transaction};
use crate::error::{NormalizerError, Result};
use crate::http::flags::{Anomaly, FieldFlags};
use crate::http::headers::Merge;
use crate::http::lines::{self, HeaderLine};
use crate::http::protocol::HttpProtocol;
use crate::http::tokenizer;
use crate::observability::metrics;

/// Parses both directions of one connection.
///
/// Not meant for concurrent use: feed each direction from one place, in
/// connection order.
pub struct ConnectionParser {
    config: ParserConfig,
    conn: Connection,
    request: DirectionalState,
    response: DirectionalState,
    log: DiagnosticLog,
    last_error: Option<LogEntry>,
    user_data: Option<Box<dyn Any + Send>>,
    destroyed: bool,
}

impl std::fmt::Debug for ConnectionParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionParser")
            .field("request_state", &self.request.state)
            .field("response_state", &self.response.state)
            .field("request_tx", &self.request.tx_index)
            .field("response_tx", &self.response.tx_index)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

impl ConnectionParser {
    /// Create a parser with its own copy of `config`.
    ///
    /// Both line buffers are allocated up front; if either allocation fails
    /// nothing is kept.
    pub fn create(config: &ParserConfig) -> Result<Self> {
        let config = config.clone();
        let request = DirectionalState::new(Direction::Request, config.field_limit_hard)?;
        let response = DirectionalState::new(Direction::Response, config.field_limit_hard)?;

        tracing::debug!(
            field_limit_hard = config.field_limit_hard,
            field_limit_soft = config.field_limit_soft,
            "connection parser created"
        );

        Ok(Self {
            log: DiagnosticLog::new(config.log_level),
            config,
            conn: Connection::default(),
            request,
            response,
            last_error: None,
            user_data: None,
            destroyed: false,
        })
    }

    /// Record endpoint metadata. Does not affect parsing.
    pub fn open(
        &mut self,
        remote_addr: IpAddr,
        remote_port: u16,
        local_addr: IpAddr,
        local_port: u16,
    ) {
        self.conn.remote_addr = Some(remote_addr);
        self.conn.remote_port = Some(remote_port);
        self.conn.local_addr = Some(local_addr);
        self.conn.local_port = Some(local_port);
        self.conn.status = ConnectionStatus::Open;
        self.conn.opened_at = Some(SystemTime::now());

        tracing::debug!(
            remote = %remote_addr,
            remote_port,
            local = %local_addr,
            local_port,
            "connection opened"
        );
    }

    /// Mark the connection closed.
    ///
    /// A body that runs until close is complete now. A direction stopped in
    /// the middle of a message flags its transaction as incomplete.
    pub fn close(&mut self) {
        self.conn.status = ConnectionStatus::Closed;
        self.conn.closed_at = Some(SystemTime::now());

        for direction in [Direction::Request, Direction::Response] {
            let side = self.side(direction);
            match (side.state, side.body) {
                (State::Body, BodyFraming::UntilClose) => self.complete_message(direction),
                (State::Line | State::Headers | State::Body, _) => {
                    let tx_index = side.tx_index;
                    self.apply_anomalies(direction, tx_index, &[Anomaly::Incomplete]);
                }
                _ => {}
            }
        }

        tracing::debug!(transactions = self.conn.transactions.len(), "connection closed");
    }

    /// Release the line buffers and any partial line.
    ///
    /// The connection history stays available. Calling this again does
    /// nothing; feeding data afterwards fails with
    /// [`NormalizerError::Destroyed`].
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.request.release();
        self.response.release();
        self.destroyed = true;
    }

    /// Release everything, the connection history included.
    pub fn destroy_all(self) {
        drop(self);
    }

    /// Take the connection history out of the parser.
    pub fn into_connection(self) -> Connection {
        self.conn
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// The most recent error, if any.
    pub fn last_error(&self) -> Option<&LogEntry> {
        self.last_error.as_ref()
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Attach opaque data, replacing any previous value.
    pub fn set_user_data<T: Any + Send>(&mut self, data: T) {
        self.user_data = Some(Box::new(data));
    }

    pub fn user_data<T: Any>(&self) -> Option<&T> {
        self.user_data.as_ref()?.downcast_ref()
    }

    pub fn user_data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.user_data.as_mut()?.downcast_mut()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn log(&self) -> &DiagnosticLog {
        &self.log
    }

    pub fn side(&self, direction: Direction) -> &DirectionalState {
        match direction {
            Direction::Request => &self.request,
            Direction::Response => &self.response,
        }
    }

    pub fn request_state(&self) -> State {
        self.request.state
    }

    pub fn response_state(&self) -> State {
        self.response.state
    }

    /// Transaction the request direction is working on.
    pub fn request_tx(&self) -> Option<&Transaction> {
        self.conn.transaction(self.request.tx_index)
    }

    /// Transaction the response direction is working on.
    pub fn response_tx(&self) -> Option<&Transaction> {
        self.conn.transaction(self.response.tx_index)
    }

    /// Feed client-to-server bytes.
    pub fn feed_request(&mut self, data: &[u8]) -> Result<State> {
        self.feed(Direction::Request, data)
    }

    /// Feed server-to-client bytes.
    pub fn feed_response(&mut self, data: &[u8]) -> Result<State> {
        self.feed(Direction::Response, data)
    }

    /// Consume all of `data` for `direction`, returning the state afterwards.
    pub fn feed(&mut self, direction: Direction, data: &[u8]) -> Result<State> {
        if self.destroyed {
            return Err(NormalizerError::Destroyed);
        }
        if self.side(direction).state == State::Error {
            return Err(NormalizerError::StreamFailed(direction));
        }

        let mut pos = 0;
        while pos < data.len() {
            let rest = &data[pos..];
            let consumed = match self.side(direction).state {
                State::Idle => {
                    self.start_message(direction);
                    0
                }
                State::Line | State::Headers => match self.read_line(direction, rest) {
                    Ok(consumed) => consumed,
                    Err(err) => {
                        self.fail(direction, &err);
                        return Err(err);
                    }
                },
                State::Body => self.read_body(direction, rest),
                State::Done => {
                    self.next_message(direction);
                    0
                }
                State::Error => return Err(NormalizerError::StreamFailed(direction)),
            };
            pos += consumed;
        }

        Ok(self.side(direction).state)
    }

    fn side_mut(&mut self, direction: Direction) -> &mut DirectionalState {
        match direction {
            Direction::Request => &mut self.request,
            Direction::Response => &mut self.response,
        }
    }

    fn set_state(&mut self, direction: Direction, to: State) {
        let side = self.side_mut(direction);
        let from = side.state;
        side.state = to;
        let tx_index = side.tx_index;

        self.conn
            .transaction_or_create(tx_index)
            .message_mut(direction)
            .progress = to;

        tracing::debug!(%direction, tx = tx_index, ?from, ?to, "state transition");
    }

    fn start_message(&mut self, direction: Direction) {
        let tx_index = self.side(direction).tx_index;
        self.conn.transaction_or_create(tx_index);
        self.set_state(direction, State::Line);
    }

    fn next_message(&mut self, direction: Direction) {
        let side = self.side_mut(direction);
        side.reset_message();
        side.tx_index += 1;
        side.state = State::Idle;
    }

    fn complete_message(&mut self, direction: Direction) {
        self.set_state(direction, State::Done);
        metrics::record_message(direction);
    }

    /// Buffer bytes up to and including the next LF, then process the line.
    fn read_line(&mut self, direction: Direction, data: &[u8]) -> Result<usize> {
        let side = self.side_mut(direction);
        let Some(eol) = memchr(b'\n', data) else {
            side.buffer.append(data)?;
            return Ok(data.len());
        };

        side.buffer.append(&data[..=eol])?;
        let raw = side.buffer.as_bytes().to_vec();
        side.buffer.reset();

        let state = side.state;
        match state {
            State::Line => self.process_start_line(direction, raw)?,
            State::Headers => self.process_header_line(direction, raw),
            _ => {}
        }
        Ok(eol + 1)
    }

    fn process_start_line(&mut self, direction: Direction, raw: Vec<u8>) -> Result<()> {
        let tx_index = self.side(direction).tx_index;
        let line = &raw[..lines::content_len(&raw)];

        if line.is_empty() {
            self.apply_anomalies(direction, tx_index, &[Anomaly::EmptyLinesSkipped]);
            return Ok(());
        }

        let mut anomalies = Vec::new();
        if line.len() > self.config.field_limit_soft {
            anomalies.push(Anomaly::LongField);
        }

        let tx = self.conn.transaction_or_create(tx_index);
        let mut headerless = false;
        match direction {
            Direction::Request => {
                let parsed = tokenizer::parse_request_line(line, &mut anomalies)?;
                headerless = parsed.protocol_number == HttpProtocol::V0_9;
                tx.request_line = Some(parsed);
            }
            Direction::Response => {
                tx.response_line = Some(tokenizer::parse_response_line(line, &mut anomalies)?);
            }
        }
        tx.message_mut(direction).line = line.to_vec();

        self.apply_anomalies(direction, tx_index, &anomalies);
        self.set_state(direction, State::Headers);

        // HTTP/0.9 requests carry neither headers nor a body.
        if headerless {
            self.finish_headers(direction);
        }
        Ok(())
    }

    /// Commit one header line and close the field it ends, if any.
    fn process_header_line(&mut self, direction: Direction, raw: Vec<u8>) {
        let line = HeaderLine::new(raw);
        let side = self.side(direction);
        let tx_index = side.tx_index;
        let open_field = side.header_line_index;

        if line.is_blank() {
            if let Some(start) = open_field {
                let end = self.side(direction).header_line_counter;
                self.process_header_field(direction, start..end);
            }
            self.side_mut(direction).header_line_index = None;
            self.finish_headers(direction);
            return;
        }

        let continuation = line.is_continuation();
        let current = {
            let message = self.conn.transaction_or_create(tx_index).message_mut(direction);
            message.header_lines.push(line);
            message.header_lines.len() - 1
        };
        self.side_mut(direction).header_line_counter = current + 1;

        if continuation && open_field.is_some() {
            return;
        }

        if continuation {
            self.apply_anomalies(direction, tx_index, &[Anomaly::InvalidFolding]);
        }
        if let Some(start) = open_field {
            self.process_header_field(direction, start..current);
        }
        self.side_mut(direction).header_line_index = Some(current);
    }

    /// Tokenize the field spanning `span` header lines and merge it into the
    /// header table. A field without a colon is dropped.
    fn process_header_field(&mut self, direction: Direction, span: Range<usize>) {
        let tx_index = self.side(direction).tx_index;
        let soft_limit = self.config.field_limit_soft;
        let mut anomalies = Vec::new();

        let message = self.conn.transaction_or_create(tx_index).message_mut(direction);
        let view = lines::assemble(&message.header_lines, span.clone());
        let folded = view.is_folded();
        let long = view.len() > soft_limit;

        if let Ok(mut field) = tokenizer::parse_header(&view, &mut anomalies) {
            if folded {
                field.flags |= FieldFlags::FOLDED;
                anomalies.push(Anomaly::FoldedField);
            }
            if long {
                field.flags |= FieldFlags::LONG;
                anomalies.push(Anomaly::LongField);
            }

            let merge = message.headers.insert(field);
            if let Merge::Combined(_) = merge {
                anomalies.push(Anomaly::RepeatedField);
            }
            for line in &mut message.header_lines[span] {
                line.bind_header(merge.index());
            }
        }

        self.apply_anomalies(direction, tx_index, &anomalies);
    }

    fn finish_headers(&mut self, direction: Direction) {
        let tx_index = self.side(direction).tx_index;
        let tx = self.conn.transaction_or_create(tx_index);

        // The final response to this request is still to come.
        if direction == Direction::Response && tx.has_interim_response() {
            tx.shelve_interim_response();
            tracing::debug!(tx = tx_index, "interim response, awaiting final response");
            self.side_mut(direction).reset_message();
            self.set_state(direction, State::Line);
            return;
        }

        let (framing, anomaly) = body_framing(tx, direction);

        if let Some(anomaly) = anomaly {
            self.apply_anomalies(direction, tx_index, &[anomaly]);
        }

        self.side_mut(direction).body = framing;
        self.set_state(direction, State::Body);
        if framing == BodyFraming::None {
            self.complete_message(direction);
        }
    }

    fn read_body(&mut self, direction: Direction, data: &[u8]) -> usize {
        let side = self.side_mut(direction);
        let tx_index = side.tx_index;

        let (consumed, finished) = match side.body {
            BodyFraming::Length(left) => {
                let n = left.min(data.len() as u64);
                side.body = BodyFraming::Length(left - n);
                (n as usize, left == n)
            }
            BodyFraming::UntilClose => (data.len(), false),
            BodyFraming::None => (0, true),
        };

        self.conn
            .transaction_or_create(tx_index)
            .message_mut(direction)
            .body_len += consumed as u64;

        if finished {
            self.complete_message(direction);
        }
        consumed
    }

    /// Move `direction` to `ERROR` after a fatal condition.
    #[track_caller]
    fn fail(&mut self, direction: Direction, err: &NormalizerError) {
        self.set_state(direction, State::Error);
        let tx_index = self.side(direction).tx_index;

        let code = match err {
            NormalizerError::BufferLimitExceeded { .. } => {
                let tx = self.conn.transaction_or_create(tx_index);
                if tx.raise(Anomaly::FieldTooLong) {
                    metrics::record_anomaly(Anomaly::FieldTooLong);
                }
                Some(Anomaly::FieldTooLong.code())
            }
            _ => None,
        };

        metrics::record_fatal(direction, err);
        self.record(direction, Some(tx_index), Severity::Error, code, err.to_string());
    }

    /// Raise the transaction flag of each anomaly, logging the ones that are
    /// new to the transaction.
    #[track_caller]
    fn apply_anomalies(&mut self, direction: Direction, tx_index: usize, anomalies: &[Anomaly]) {
        for &anomaly in anomalies {
            if !self.conn.transaction_or_create(tx_index).raise(anomaly) {
                continue;
            }
            metrics::record_anomaly(anomaly);
            self.record(
                direction,
                Some(tx_index),
                anomaly.severity(),
                Some(anomaly.code()),
                anomaly.message(),
            );
        }
    }

    #[track_caller]
    fn record(
        &mut self,
        direction: Direction,
        tx: Option<usize>,
        severity: Severity,
        code: Option<u16>,
        message: impl Into<String>,
    ) {
        let entry = LogEntry {
            location: Location::caller(),
            severity,
            code,
            message: message.into(),
            direction: Some(direction),
            tx,
        };
        if severity == Severity::Error {
            self.last_error = Some(entry.clone());
        }
        self.log.push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::flags::TxFlags;

    fn parser() -> ConnectionParser {
        ConnectionParser::create(&ParserConfig::default()).unwrap()
    }

    #[test]
    fn create_starts_idle() {
        let connp = parser();
        assert_eq!(connp.request_state(), State::Idle);
        assert_eq!(connp.response_state(), State::Idle);
        assert!(connp.connection().transactions.is_empty());
        assert!(connp.last_error().is_none());
    }

    #[test]
    fn create_copies_config() {
        let mut config = ParserConfig::default();
        let connp = ConnectionParser::create(&config).unwrap();
        config.field_limit_hard = 1;
        assert_eq!(
            connp.config().field_limit_hard,
            ParserConfig::default().field_limit_hard
        );
        assert_eq!(
            connp.side(Direction::Request).buffer().limit(),
            ParserConfig::default().field_limit_hard
        );
    }

    #[test]
    fn response_moves_through_states() {
        let mut connp = parser();
        assert_eq!(connp.feed_response(b"HTTP/1.1 200").unwrap(), State::Line);
        assert_eq!(connp.feed_response(b" OK\r\n").unwrap(), State::Headers);
        assert_eq!(
            connp.feed_response(b"Content-Length: 4\r\n\r\n").unwrap(),
            State::Body
        );
        assert_eq!(connp.feed_response(b"ab").unwrap(), State::Body);
        assert_eq!(connp.feed_response(b"cd").unwrap(), State::Done);

        let tx = connp.response_tx().unwrap();
        assert_eq!(tx.response.body_len, 4);
        assert_eq!(tx.response.progress, State::Done);
        assert_eq!(tx.response_status_number(), Some(200));
    }

    #[test]
    fn empty_feed_stays_idle() {
        let mut connp = parser();
        assert_eq!(connp.feed_request(b"").unwrap(), State::Idle);
        assert!(connp.connection().transactions.is_empty());
    }

    #[test]
    fn open_stores_local_endpoint() {
        let mut connp = parser();
        let remote: IpAddr = "10.0.0.1".parse().unwrap();
        let local: IpAddr = "10.0.0.2".parse().unwrap();
        connp.open(remote, 40000, local, 80);

        let conn = connp.connection();
        assert_eq!(conn.remote_addr, Some(remote));
        assert_eq!(conn.remote_port, Some(40000));
        assert_eq!(conn.local_addr, Some(local));
        assert_eq!(conn.local_port, Some(80));
        assert_eq!(conn.status, ConnectionStatus::Open);
    }

    #[test]
    fn close_completes_body_until_close() {
        let mut connp = parser();
        connp
            .feed_response(b"HTTP/1.0 200 OK\r\n\r\nhello")
            .unwrap();
        assert_eq!(connp.response_state(), State::Body);

        connp.close();
        assert_eq!(connp.response_state(), State::Done);
        let tx = connp.response_tx().unwrap();
        assert_eq!(tx.response.body_len, 5);
        assert!(!tx.flags.contains(TxFlags::INCOMPLETE));
    }

    #[test]
    fn close_mid_headers_flags_incomplete() {
        let mut connp = parser();
        connp.feed_request(b"GET / HTTP/1.1\r\nHost: x\r\n").unwrap();
        connp.close();
        let tx = connp.request_tx().unwrap();
        assert!(tx.flags.contains(TxFlags::INCOMPLETE));
        assert_eq!(connp.connection().status, ConnectionStatus::Closed);
    }

    #[test]
    fn destroy_is_idempotent_and_keeps_history() {
        let mut connp = parser();
        connp.feed_request(b"GET / HTTP/1.1\r\n\r\n").unwrap();

        connp.destroy();
        connp.destroy();
        assert!(connp.is_destroyed());
        assert_eq!(connp.side(Direction::Request).buffer().capacity(), 0);
        assert_eq!(connp.connection().transactions.len(), 1);
        assert_eq!(
            connp.feed_request(b"GET / HTTP/1.1\r\n"),
            Err(NormalizerError::Destroyed)
        );
    }

    #[test]
    fn clear_error_empties_last_error() {
        let mut connp = parser();
        connp
            .feed_response(b"HTTP/1.1 200 OK\r\nbroken\r\n\r\n")
            .unwrap();
        assert!(connp.last_error().is_some());

        connp.clear_error();
        assert!(connp.last_error().is_none());
        connp.clear_error();
        assert!(connp.last_error().is_none());
    }

    #[test]
    fn user_data_round_trips() {
        let mut connp = parser();
        assert!(connp.user_data::<u32>().is_none());

        connp.set_user_data(7u32);
        assert_eq!(connp.user_data::<u32>(), Some(&7));
        assert!(connp.user_data::<String>().is_none());

        *connp.user_data_mut::<u32>().unwrap() += 1;
        assert_eq!(connp.user_data::<u32>(), Some(&8));
    }

    #[test]
    fn stream_error_is_absorbing() {
        let config = ParserConfig {
            field_limit_hard: 16,
            field_limit_soft: 16,
            ..Default::default()
        };
        let mut connp = ConnectionParser::create(&config).unwrap();

        let err = connp
            .feed_response(b"HTTP/1.1 200 OK but far too long")
            .unwrap_err();
        assert!(matches!(err, NormalizerError::BufferLimitExceeded { .. }));
        assert_eq!(connp.response_state(), State::Error);
        assert_eq!(
            connp.feed_response(b"\r\n"),
            Err(NormalizerError::StreamFailed(Direction::Response))
        );

        // The other direction is unaffected.
        assert_eq!(connp.feed_request(b"GET / HTTP/1.1\r\n").unwrap(), State::Headers);
    }
}
