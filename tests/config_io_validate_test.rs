use formentor::config::Config;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.account.username = "driver@example.com".to_string();
    cfg.account.password = "hunter2".to_string();
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.account.username, "driver@example.com");
    assert_eq!(loaded.account.service, "MyCupra");
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();
    cfg.account.username = "driver@example.com".to_string();
    cfg.account.password = "hunter2".to_string();
    assert!(cfg.validate().is_ok());

    // Credentials are mandatory
    let mut bad = cfg.clone();
    bad.account.username.clear();
    assert!(bad.validate().is_err());

    let mut bad = cfg.clone();
    bad.account.password.clear();
    assert!(bad.validate().is_err());

    // Only the MyCupra brand profile passes
    let mut bad = cfg.clone();
    bad.account.service = "MySkoda".to_string();
    assert!(bad.validate().is_err());

    let mut bad = cfg.clone();
    bad.account.service = "WeConnect".to_string();
    assert!(bad.validate().is_err());

    // API base must be a URL
    let mut bad = cfg.clone();
    bad.account.api_base = "ftp://example.invalid".to_string();
    assert!(bad.validate().is_err());

    // Zero cadence or timeouts
    let mut bad = cfg.clone();
    bad.polling.interval_seconds = 0;
    assert!(bad.validate().is_err());

    let mut bad = cfg.clone();
    bad.polling.refresh_timeout_seconds = 0;
    assert!(bad.validate().is_err());

    let mut bad = cfg.clone();
    bad.polling.request_timeout_seconds = 0;
    assert!(bad.validate().is_err());

    // Invalid port
    let mut bad = cfg;
    bad.web.port = 0;
    assert!(bad.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn partial_file_fills_missing_sections_with_defaults() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");
    fs::write(
        &path,
        b"account:\n  username: driver@example.com\n  password: hunter2\n  service: MyCupra\n  api_base: https://example.invalid\nweb:\n  host: 0.0.0.0\n  port: 9090\n",
    )
    .unwrap();

    let cfg = Config::from_file(&path).unwrap();
    assert_eq!(cfg.web.port, 9090);
    assert_eq!(cfg.polling.interval_seconds, 300);
    assert_eq!(cfg.polling.refresh_timeout_seconds, 120);
    assert_eq!(cfg.logging.level, "INFO");
    assert!(cfg.validate().is_ok());
}
