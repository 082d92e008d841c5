//! Configuration file loading.

use std::io::Write;

use http_normalizer::config::{load_config, ConfigError, LogFormat};
use http_normalizer::connection::{ConnectionParser, Severity};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_full_config() {
    let file = write_config(
        r#"
[parser]
field_limit_hard = 4096
field_limit_soft = 1024
log_level = "debug"

[observability]
log_level = "http_normalizer=debug"
log_format = "json"
metrics_enabled = true
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.parser.field_limit_hard, 4096);
    assert_eq!(config.parser.field_limit_soft, 1024);
    assert_eq!(config.parser.log_level, Severity::Debug);
    assert_eq!(config.observability.log_format, LogFormat::Json);
    assert!(config.observability.metrics_enabled);

    let parser = ConnectionParser::create(&config.parser).unwrap();
    assert_eq!(parser.config().field_limit_hard, 4096);
}

#[test]
fn test_invalid_limits_are_all_reported() {
    let file = write_config(
        r#"
[parser]
field_limit_hard = 0

[observability]
log_level = "http_normalizer=loudest"
"#,
    );

    match load_config(file.path()) {
        Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 3),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_malformed_toml() {
    let file = write_config("[parser\nfield_limit_hard = ");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Parse(_))
    ));
}
