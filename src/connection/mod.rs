//! Connection-level parsing.
//!
//! # Data Flow
//! ```text
//! feed_request / feed_response
//!     │
//!     ▼
//! DirectionalState (state, line buffer, open field)
//!     │ complete line
//!     ▼
//! Transaction (start line, raw header lines, header table, flags)
//!     │
//!     ├──▶ DiagnosticLog (deduplicated per transaction flag)
//!     └──▶ Connection (transaction history)
//! ```
//!
//! # Design Decisions
//! - Each direction owns its state; the two only meet in the transaction
//!   they share by index
//! - A fatal error stops one direction and leaves the other running

pub mod direction;
pub mod log;
pub mod parser;
pub mod state;
pub mod transaction;

pub use direction::{Direction, DirectionalState};
pub use log::{DiagnosticLog, Location, LogEntry, Severity};
pub use parser::ConnectionParser;
pub use state::{ConnectionStatus, State};
pub use transaction::{BodyFraming, Connection, InterimResponse, Message, Transaction};
