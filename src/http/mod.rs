//! HTTP line and header reconstruction engine.
//!
//! # Data Flow
//! ```text
//! raw bytes (one direction)
//!     → buffer.rs (accumulate until LF, bounded by the hard field limit)
//!     → lines.rs (commit line, group continuation lines into one field)
//!     → tokenizer.rs (start line / name + value, anomalies)
//!     → headers.rs (merge repeated names)
//!     → transaction slots (owned by the connection parser)
//! ```
//!
//! # Design Decisions
//! - Every component is direction-agnostic; only the start line grammar
//!   differs between requests and responses
//! - Nothing in here logs or touches a transaction. Anomalies are returned
//!   to the connection parser, which flags and logs them

pub mod buffer;
pub mod classify;
pub mod flags;
pub mod headers;
pub mod lines;
pub mod protocol;
pub mod tokenizer;

pub use flags::{Anomaly, FieldFlags, TxFlags};
pub use headers::{HeaderField, HeaderTable, Merge};
pub use lines::{FieldView, HeaderLine};
pub use protocol::{HttpProtocol, Method};
pub use tokenizer::{RequestLine, ResponseLine};

use serde::Serializer;

/// Serialize raw bytes as text, replacing invalid UTF-8.
pub(crate) fn serialize_lossy<T, S>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: AsRef<[u8]>,
    S: Serializer,
{
    serializer.serialize_str(&String::from_utf8_lossy(bytes.as_ref()))
}
