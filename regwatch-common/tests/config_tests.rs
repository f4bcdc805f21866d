//! Configuration file loading and graceful degradation
//!
//! Tests that set XDG_CONFIG_HOME are marked #[serial] so they never race on
//! process environment.

use regwatch_common::config::{load_toml_config, CompiledDefaults};
use regwatch_common::Error;
use serial_test::serial;
use std::env;
use std::fs;

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let config = load_toml_config(Some(&path)).expect("missing file must not fail");
    assert!(config.server.port.is_none());
    assert!(config.database.url.is_none());
    assert_eq!(config.logging.level, CompiledDefaults::LOG_LEVEL);
}

#[test]
fn existing_file_is_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
        [server]
        host = "0.0.0.0"
        port = 5050

        [database]
        url = "sqlite://custom.db"

        [scraper]
        timeout_secs = 5

        [logging]
        level = "debug"
        "#,
    )
    .unwrap();

    let config = load_toml_config(Some(&path)).unwrap();
    assert_eq!(config.server.host.as_deref(), Some("0.0.0.0"));
    assert_eq!(config.server.port, Some(5050));
    assert_eq!(config.database.url.as_deref(), Some("sqlite://custom.db"));
    assert_eq!(config.scraper.timeout_secs, Some(5));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn malformed_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[server\nport = 1").unwrap();

    let result = load_toml_config(Some(&path));
    assert!(matches!(result, Err(Error::Config(_))));
}

#[cfg(target_os = "linux")]
#[test]
#[serial]
fn default_location_is_used_when_no_path_given() {
    let dir = tempfile::tempdir().unwrap();
    let config_dir = dir.path().join("regwatch");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[server]\nport = 6000\n").unwrap();

    let previous = env::var("XDG_CONFIG_HOME").ok();
    env::set_var("XDG_CONFIG_HOME", dir.path());

    let config = load_toml_config(None).unwrap();

    match previous {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }

    assert_eq!(config.server.port, Some(6000));
}

#[test]
fn compiled_cors_defaults_cover_local_frontend() {
    let origins = CompiledDefaults::cors_origins();
    assert!(origins.contains(&"http://localhost:3000".to_string()));
    assert_eq!(origins.len(), 3);
}
