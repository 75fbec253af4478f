//! Comprehensive unit tests for config.rs module

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use tempfile::tempdir;

use iphone_messages_dump::config::AppConfig;
use iphone_messages_dump::privacy::DEFAULT_PLACEHOLDER;
use iphone_messages_dump::{DumpError, OutputFormat, WriteMode};

/// Serializes tests that load configuration, since loading reads the process environment
static ENV_LOCK: Mutex<()> = Mutex::new(());

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[test]
fn test_default_logging_config() {
    let config = AppConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.file_path, None);
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_default_extract_config() {
    let config = AppConfig::default();

    assert!(config.extract.input_pattern.is_empty());
    assert!(!config.extract.sent_only);
    assert_eq!(config.extract.year, None);
}

#[test]
fn test_default_export_config() {
    let config = AppConfig::default();

    assert_eq!(config.export.format, "csv");
    assert_eq!(config.export.output, "txt_messages");
    assert_eq!(config.export.mode, "merge");
    assert!(config.export.redact_text);
    assert_eq!(config.export.redaction_placeholder, DEFAULT_PLACEHOLDER);
}

#[test]
fn test_config_validation_success() {
    let config = AppConfig::default();
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_invalid_log_level() {
    let mut config = AppConfig::default();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_invalid_log_format() {
    let mut config = AppConfig::default();
    config.logging.format = "xml".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_invalid_export_format() {
    let mut config = AppConfig::default();
    config.export.format = "txt".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_invalid_mode() {
    let mut config = AppConfig::default();
    config.export.mode = "replace".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_year_out_of_range() {
    let mut config = AppConfig::default();
    config.extract.year = Some(1969);
    assert!(config.validate().is_err());

    config.extract.year = Some(2012);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_empty_placeholder() {
    let mut config = AppConfig::default();
    config.export.redaction_placeholder = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_format_is_case_insensitive() {
    let mut config = AppConfig::default();
    config.export.format = "JSON".to_string();
    assert!(config.validate().is_ok());
    assert_eq!(config.to_dump_config().unwrap().format, OutputFormat::Json);
}

#[test]
fn test_to_dump_config() {
    let mut config = AppConfig::default();
    config.extract.input_pattern = "/backups/*/sms.db".to_string();
    config.extract.sent_only = true;
    config.extract.year = Some(2012);
    config.export.format = "json".to_string();
    config.export.output = "out/dump".to_string();
    config.export.mode = "create".to_string();
    config.export.redact_text = false;

    let dump = config.to_dump_config().unwrap();

    assert_eq!(dump.input_pattern, "/backups/*/sms.db");
    assert_eq!(dump.output_path, PathBuf::from("out/dump.json"));
    assert_eq!(dump.format, OutputFormat::Json);
    assert_eq!(dump.mode, WriteMode::Create);
    assert!(dump.extract.sent_only);
    assert_eq!(dump.extract.year, Some(2012));
    assert!(!dump.redaction.enabled);
}

#[test]
fn test_to_dump_config_rejects_unknown_format() {
    let mut config = AppConfig::default();
    config.export.format = "xml".to_string();
    assert!(matches!(config.to_dump_config(), Err(DumpError::InvalidConfig(_))));
}

#[test]
fn test_load_from_file() {
    let _guard = env_lock();
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.toml");
    fs::write(
        &path,
        r#"
[extract]
sent_only = true
year = 2013

[export]
format = "json"
redaction_placeholder = "***"
"#,
    )
    .unwrap();

    let config = AppConfig::load(Some(&path)).unwrap();

    assert!(config.extract.sent_only);
    assert_eq!(config.extract.year, Some(2013));
    assert_eq!(config.export.format, "json");
    assert_eq!(config.export.redaction_placeholder, "***");
    // Untouched keys keep their defaults
    assert_eq!(config.export.mode, "merge");
    assert!(config.export.redact_text);
}

#[test]
fn test_load_rejects_invalid_file_values() {
    let _guard = env_lock();
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "[export]\nformat = \"xml\"\n").unwrap();

    assert!(AppConfig::load(Some(&path)).is_err());
}

#[test]
fn test_load_missing_explicit_file_fails() {
    let _guard = env_lock();
    let dir = tempdir().unwrap();
    assert!(AppConfig::load(Some(&dir.path().join("missing.toml"))).is_err());
}

#[test]
fn test_env_overrides_config_file() {
    let _guard = env_lock();
    let dir = tempdir().unwrap();
    let path = dir.path().join("dump.toml");
    fs::write(&path, "[export]\nformat = \"csv\"\noutput = \"from_file\"\n").unwrap();

    std::env::set_var("IPHONE_DUMP_EXPORT__FORMAT", "json");
    let loaded = AppConfig::load(Some(&path));
    std::env::remove_var("IPHONE_DUMP_EXPORT__FORMAT");
    let config = loaded.unwrap();

    assert_eq!(config.export.format, "json");
    assert_eq!(config.export.output, "from_file");
    assert_eq!(config.to_dump_config().unwrap().output_path, PathBuf::from("from_file.json"));
}
