//! Anomaly flags.
//!
//! Every malformed or ambiguous construct is an [`Anomaly`]. Each anomaly
//! class maps to a flag on the entity it was found in ([`FieldFlags`]) and to
//! a transaction-wide flag ([`TxFlags`]). The transaction flag doubles as the
//! deduplication key: a class is logged only when its transaction flag is
//! first raised.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::connection::log::Severity;

bitflags! {
    /// Flags attached to a single header field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FieldFlags: u32 {
        /// The line had no colon; no field was produced from it.
        const UNPARSEABLE = 0x0001;
        /// Empty name, whitespace before the colon, or non-token name bytes.
        const INVALID = 0x0002;
        /// Several wire-level fields were combined into this one.
        const REPEATED = 0x0004;
        /// The field was assembled from continuation lines.
        const FOLDED = 0x0008;
        /// The field is longer than the soft field limit.
        const LONG = 0x0010;
    }
}

bitflags! {
    /// Flags attached to a transaction. Each is raised at most once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TxFlags: u32 {
        const FIELD_UNPARSEABLE = 0x0001;
        const FIELD_INVALID = 0x0002;
        const FIELD_REPEATED = 0x0004;
        const FIELD_FOLDED = 0x0008;
        const FIELD_LONG = 0x0010;
        /// A line hit the hard field limit; parsing of the message stopped.
        const FIELD_TOO_LONG = 0x0020;
        /// A continuation line appeared with no header to continue.
        const INVALID_FOLDING = 0x0040;
        const STATUS_LINE_INVALID = 0x0080;
        const REQUEST_LINE_INVALID = 0x0100;
        /// Empty lines preceded the start line.
        const EMPTY_LINES_SKIPPED = 0x0200;
        const INVALID_CONTENT_LENGTH = 0x0400;
        /// The connection closed before the message was complete.
        const INCOMPLETE = 0x0800;
    }
}

/// A class of malformed or ambiguous input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anomaly {
    MissingColon,
    EmptyName,
    WhitespaceAfterName,
    NameNotToken,
    RepeatedField,
    FoldedField,
    InvalidFolding,
    LongField,
    FieldTooLong,
    EmptyLinesSkipped,
    InvalidStatusLine,
    InvalidRequestLine,
    InvalidContentLength,
    Incomplete,
}

impl Anomaly {
    /// Flag raised on the field the anomaly was found in.
    pub fn field_flag(self) -> FieldFlags {
        match self {
            Anomaly::MissingColon => FieldFlags::UNPARSEABLE,
            Anomaly::EmptyName | Anomaly::WhitespaceAfterName | Anomaly::NameNotToken => {
                FieldFlags::INVALID
            }
            Anomaly::RepeatedField => FieldFlags::REPEATED,
            Anomaly::FoldedField => FieldFlags::FOLDED,
            Anomaly::LongField => FieldFlags::LONG,
            _ => FieldFlags::empty(),
        }
    }

    /// Transaction-wide flag, also the deduplication key.
    pub fn tx_flag(self) -> TxFlags {
        match self {
            Anomaly::MissingColon => TxFlags::FIELD_UNPARSEABLE,
            Anomaly::EmptyName | Anomaly::WhitespaceAfterName | Anomaly::NameNotToken => {
                TxFlags::FIELD_INVALID
            }
            Anomaly::RepeatedField => TxFlags::FIELD_REPEATED,
            Anomaly::FoldedField => TxFlags::FIELD_FOLDED,
            Anomaly::InvalidFolding => TxFlags::INVALID_FOLDING,
            Anomaly::LongField => TxFlags::FIELD_LONG,
            Anomaly::FieldTooLong => TxFlags::FIELD_TOO_LONG,
            Anomaly::EmptyLinesSkipped => TxFlags::EMPTY_LINES_SKIPPED,
            Anomaly::InvalidStatusLine => TxFlags::STATUS_LINE_INVALID,
            Anomaly::InvalidRequestLine => TxFlags::REQUEST_LINE_INVALID,
            Anomaly::InvalidContentLength => TxFlags::INVALID_CONTENT_LENGTH,
            Anomaly::Incomplete => TxFlags::INCOMPLETE,
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Anomaly::MissingColon | Anomaly::FieldTooLong => Severity::Error,
            Anomaly::RepeatedField | Anomaly::FoldedField => Severity::Notice,
            _ => Severity::Warning,
        }
    }

    /// Stable numeric code carried in diagnostic entries.
    pub fn code(self) -> u16 {
        match self {
            Anomaly::MissingColon => 1,
            Anomaly::EmptyName => 2,
            Anomaly::WhitespaceAfterName => 3,
            Anomaly::NameNotToken => 4,
            Anomaly::RepeatedField => 5,
            Anomaly::FoldedField => 6,
            Anomaly::InvalidFolding => 7,
            Anomaly::LongField => 8,
            Anomaly::FieldTooLong => 9,
            Anomaly::EmptyLinesSkipped => 10,
            Anomaly::InvalidStatusLine => 11,
            Anomaly::InvalidRequestLine => 12,
            Anomaly::InvalidContentLength => 13,
            Anomaly::Incomplete => 14,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Anomaly::MissingColon => "Field invalid: colon missing",
            Anomaly::EmptyName => "Field invalid: empty name",
            Anomaly::WhitespaceAfterName => "Field invalid: LWS after name",
            Anomaly::NameNotToken => "Field name is not a token",
            Anomaly::RepeatedField => "Repetition for header",
            Anomaly::FoldedField => "Field folded across lines",
            Anomaly::InvalidFolding => "Invalid field folding: nothing to continue",
            Anomaly::LongField => "Field exceeds soft limit",
            Anomaly::FieldTooLong => "Field exceeds hard limit",
            Anomaly::EmptyLinesSkipped => "Empty lines before start line",
            Anomaly::InvalidStatusLine => "Invalid response line: status number",
            Anomaly::InvalidRequestLine => "Invalid request line: protocol",
            Anomaly::InvalidContentLength => "Invalid C-L field",
            Anomaly::Incomplete => "Connection closed mid-message",
        }
    }

    /// Short label used for metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Anomaly::MissingColon => "missing_colon",
            Anomaly::EmptyName => "empty_name",
            Anomaly::WhitespaceAfterName => "whitespace_after_name",
            Anomaly::NameNotToken => "name_not_token",
            Anomaly::RepeatedField => "repeated_field",
            Anomaly::FoldedField => "folded_field",
            Anomaly::InvalidFolding => "invalid_folding",
            Anomaly::LongField => "long_field",
            Anomaly::FieldTooLong => "field_too_long",
            Anomaly::EmptyLinesSkipped => "empty_lines_skipped",
            Anomaly::InvalidStatusLine => "invalid_status_line",
            Anomaly::InvalidRequestLine => "invalid_request_line",
            Anomaly::InvalidContentLength => "invalid_content_length",
            Anomaly::Incomplete => "incomplete",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_name_classes_share_one_flag() {
        for anomaly in [
            Anomaly::EmptyName,
            Anomaly::WhitespaceAfterName,
            Anomaly::NameNotToken,
        ] {
            assert_eq!(anomaly.field_flag(), FieldFlags::INVALID);
            assert_eq!(anomaly.tx_flag(), TxFlags::FIELD_INVALID);
        }
    }

    #[test]
    fn transaction_only_classes_have_no_field_flag() {
        assert!(Anomaly::EmptyLinesSkipped.field_flag().is_empty());
        assert!(Anomaly::Incomplete.field_flag().is_empty());
        assert_eq!(Anomaly::FieldTooLong.severity(), Severity::Error);
    }
}
