//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! connection parser produces:
//!     → tracing events (state transitions, mirrored diagnostic entries)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → logging.rs subscriber (stderr, pretty or JSON)
//!     → Prometheus text dump (command line, when enabled)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - The library never installs a subscriber or recorder; the binary does
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
