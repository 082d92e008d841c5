//! HTTP Traffic Normalizer Library
//!
//! Reconstructs HTTP/1.x transactions from the two byte streams of a TCP
//! connection, fed in arbitrary chunks, and reports every protocol anomaly it
//! sees instead of rejecting the traffic.

pub mod config;
pub mod connection;
pub mod error;
pub mod http;
pub mod observability;

pub use config::{NormalizerConfig, ParserConfig};
pub use connection::{Connection, ConnectionParser, Direction, State, Transaction};
pub use error::{NormalizerError, Result};
