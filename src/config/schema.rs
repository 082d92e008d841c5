//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::connection::log::Severity;

/// Root configuration for the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Connection parser settings.
    pub parser: ParserConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Connection parser configuration. Copied into each parser at creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Longest line, in bytes, a direction will buffer. Also the line buffer
    /// capacity allocated per direction.
    pub field_limit_hard: usize,

    /// Lines longer than this are flagged but still parsed.
    pub field_limit_soft: usize,

    /// Diagnostic entries less severe than this are not recorded.
    pub log_level: Severity,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            field_limit_hard: 18_000,
            field_limit_soft: 9_000,
            log_level: Severity::Notice,
        }
    }
}

/// Process log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset (e.g. "info",
    /// "http_normalizer=debug").
    pub log_level: String,

    pub log_format: LogFormat,

    /// Install a Prometheus recorder and dump counters after a run.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
        }
    }
}
