//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → NormalizerConfig (validated, immutable)
//!     → ParserConfig copied into every ConnectionParser
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a parser never sees later changes
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{LogFormat, NormalizerConfig, ObservabilityConfig, ParserConfig};
pub use validation::{validate_config, ValidationError};
