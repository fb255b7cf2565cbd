use rollsync::config::Config;
use rollsync::constants::{DEFAULT_ENDPOINT, MAX_BATCH_SIZE};
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.server.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(config.server.request_timeout_secs, 60);
    assert_eq!(config.sync.batch_size, 20);
    assert_eq!(config.sync.batch_pause_ms, 500);
    assert_eq!(config.sync.retention_days, 50);
    assert!(config.sync.auto_sync);
    assert_eq!(config.capture.location_timeout(), Duration::from_secs(4));
    assert!(config.storage.database_path.is_none());
    assert!(!config.logging.enabled);
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    config.sync.batch_size = 0;
    assert!(config.validate().is_err());
    config.sync.batch_size = MAX_BATCH_SIZE + 1;
    assert!(config.validate().is_err());

    // Reset and test invalid endpoint
    config.sync.batch_size = 20;
    config.server.endpoint = "ftp://example.org".to_string();
    assert!(config.validate().is_err());

    config.server.endpoint = "http://localhost:8080/api_sync.php".to_string();
    config.server.request_timeout_secs = 0;
    assert!(config.validate().is_err());

    config.server.request_timeout_secs = 60;
    config.sync.retention_days = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let toml_str = toml::to_string_pretty(&config).unwrap();
    assert!(toml_str.contains("batch_size = 20"));
    assert!(toml_str.contains("retention_days = 50"));
}

#[test]
fn test_partial_config_deserialization() {
    // Test that partial TOML configs merge with defaults
    let partial_toml = r#"
[sync]
batch_size = 10

[logging]
enabled = true
"#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    // Check that specified values are used
    assert_eq!(config.sync.batch_size, 10);
    assert!(config.logging.enabled);

    // Check that unspecified values use defaults
    assert_eq!(config.sync.batch_pause_ms, 500);
    assert_eq!(config.sync.retention_days, 50);
    assert_eq!(config.server.endpoint, DEFAULT_ENDPOINT);
}

#[test]
fn test_empty_config_deserialization() {
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.server.endpoint, default_config.server.endpoint);
    assert_eq!(config.sync.batch_size, default_config.sync.batch_size);
    assert_eq!(config.logging.enabled, default_config.logging.enabled);
}

#[test]
fn test_load_from_file_validates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rollsync.toml");

    std::fs::write(&path, "[sync]\nbatch_size = 500\n").unwrap();
    assert!(Config::load_from_file(&path).is_err());

    std::fs::write(&path, "[storage]\ndatabase_path = \"/tmp/attendance.db\"\n").unwrap();
    let config = Config::load_from_file(&path).unwrap();
    assert_eq!(
        config.database_path().unwrap(),
        std::path::PathBuf::from("/tmp/attendance.db")
    );
}

#[test]
fn test_generate_config_creates_directory() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("nested").join("config.toml");

    // Generate config should create the directory structure
    Config::generate_default_config(&config_path).unwrap();
    assert!(config_path.exists());

    // Verify the file contains expected content and loads back
    let content = std::fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("# rollsync Configuration File"));
    assert!(content.contains("[server]"));
    let loaded = Config::load_from_file(&config_path).unwrap();
    assert_eq!(loaded.sync.batch_size, 20);
}
