//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (hard limit > 0, soft limit within hard limit)
//! - Check that the log filter directive parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: NormalizerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::NormalizerConfig;

/// One semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check `config`, collecting every problem found.
pub fn validate_config(config: &NormalizerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let parser = &config.parser;

    if parser.field_limit_hard == 0 {
        errors.push(ValidationError::new(
            "parser.field_limit_hard",
            "must be greater than 0",
        ));
    }

    if parser.field_limit_soft == 0 {
        errors.push(ValidationError::new(
            "parser.field_limit_soft",
            "must be greater than 0",
        ));
    } else if parser.field_limit_soft > parser.field_limit_hard {
        errors.push(ValidationError::new(
            "parser.field_limit_soft",
            format!(
                "{} exceeds field_limit_hard ({})",
                parser.field_limit_soft, parser.field_limit_hard
            ),
        ));
    }

    if let Err(e) = EnvFilter::try_new(&config.observability.log_level) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("invalid filter directive: {e}"),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
