//! Committed lines and folded field assembly.
//!
//! A header field starts on a line whose first byte is not linear whitespace
//! and absorbs every following line that does start with linear whitespace.
//! The parser tracks the span of lines belonging to the field under
//! construction and hands it to [`assemble`] once the span is closed.

use std::ops::{Deref, Range};

use serde::Serialize;

use crate::http::classify::is_lws;
use crate::http::serialize_lossy;

/// One raw line as received, terminator included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderLine {
    #[serde(serialize_with = "serialize_lossy")]
    raw: Vec<u8>,
    #[serde(skip)]
    content_len: usize,
    /// Index of the header-table entry this line ended up in.
    header: Option<usize>,
}

impl HeaderLine {
    /// Commit a raw line. The content ends before a trailing LF or CRLF.
    pub fn new(raw: Vec<u8>) -> Self {
        let content_len = content_len(&raw);
        Self {
            raw,
            content_len,
            header: None,
        }
    }

    /// The line as received.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The line without its terminator.
    pub fn content(&self) -> &[u8] {
        &self.raw[..self.content_len]
    }

    pub fn is_blank(&self) -> bool {
        self.content_len == 0
    }

    /// True when the line continues the previous header field.
    pub fn is_continuation(&self) -> bool {
        self.raw.first().copied().is_some_and(is_lws)
    }

    pub fn header(&self) -> Option<usize> {
        self.header
    }

    /// Record the header this line parsed into. Only the first call sticks.
    pub(crate) fn bind_header(&mut self, index: usize) {
        debug_assert!(self.header.is_none(), "header line bound twice");
        self.header.get_or_insert(index);
    }
}

/// Length of `line` without a trailing LF or CRLF.
pub(crate) fn content_len(line: &[u8]) -> usize {
    match line {
        [rest @ .., b'\r', b'\n'] | [rest @ .., b'\n'] => rest.len(),
        _ => line.len(),
    }
}

/// The bytes of one header field, borrowed when it sits on a single line and
/// owned when continuation lines had to be joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldView<'a> {
    Single(&'a [u8]),
    Assembled(Vec<u8>),
}

impl FieldView<'_> {
    pub fn is_folded(&self) -> bool {
        matches!(self, FieldView::Assembled(_))
    }
}

impl Deref for FieldView<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            FieldView::Single(bytes) => bytes,
            FieldView::Assembled(bytes) => bytes,
        }
    }
}

/// Gather the field spanning `span` of `lines`.
///
/// Line terminators are dropped; continuation lines keep their leading
/// whitespace, which the tokenizer treats as part of the value.
pub fn assemble(lines: &[HeaderLine], span: Range<usize>) -> FieldView<'_> {
    let lines = &lines[span];
    match lines {
        [] => FieldView::Single(&[]),
        [line] => FieldView::Single(line.content()),
        _ => {
            let len = lines.iter().map(|l| l.content().len()).sum();
            let mut joined = Vec::with_capacity(len);
            for line in lines {
                joined.extend_from_slice(line.content());
            }
            FieldView::Assembled(joined)
        }
    }
}
