//! Unit tests for configuration resolution and graceful degradation
//!
//! Tests the implementation of:
//! - Missing TOML files SHALL NOT cause termination
//! - Missing configs → defaults
//! - Priority order: CLI argument > environment variable > platform file
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate the config environment variable are marked with #[serial].

use serene_common::config::{ConfigResolver, DurationUnitPolicy, PlayerConfig};
use serene_common::Error;
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

const TEST_ENV_VAR: &str = "SERENE_CONFIG_TEST";

fn write_config(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("write config");
    path
}

fn resolver() -> ConfigResolver {
    ConfigResolver::new()
        .with_env_var(TEST_ENV_VAR)
        .with_platform_path(None)
}

#[test]
#[serial]
fn test_no_sources_uses_defaults() {
    env::remove_var(TEST_ENV_VAR);

    let config = resolver().load(None).expect("defaults");
    assert_eq!(config, PlayerConfig::default());
}

#[test]
#[serial]
fn test_cli_argument_wins_over_environment() {
    let dir = TempDir::new().unwrap();
    let cli = write_config(&dir, "cli.toml", "tick_interval_ms = 250\n");
    let from_env = write_config(&dir, "env.toml", "tick_interval_ms = 500\n");
    env::set_var(TEST_ENV_VAR, &from_env);

    let config = resolver().load(Some(&cli)).unwrap();
    assert_eq!(config.tick_interval_ms, 250);

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_environment_wins_over_platform_file() {
    let dir = TempDir::new().unwrap();
    let platform = write_config(&dir, "platform.toml", "default_step_seconds = 30\n");
    let from_env = write_config(&dir, "env.toml", "default_step_seconds = 45\n");
    env::set_var(TEST_ENV_VAR, &from_env);

    let config = resolver()
        .with_platform_path(Some(platform))
        .load(None)
        .unwrap();
    assert_eq!(config.default_step_seconds, 45);

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_platform_file_used_when_present() {
    env::remove_var(TEST_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let platform = write_config(
        &dir,
        "config.toml",
        "duration_unit = \"minutes\"\nevent_bus_capacity = 16\ncatalog_path = \"/data/activities.json\"\n",
    );

    let config = resolver()
        .with_platform_path(Some(platform))
        .load(None)
        .unwrap();
    assert_eq!(config.duration_unit, DurationUnitPolicy::Minutes);
    assert_eq!(config.event_bus_capacity, 16);
    assert_eq!(
        config.catalog_path.as_deref(),
        Some(std::path::Path::new("/data/activities.json"))
    );
}

#[test]
#[serial]
fn test_missing_explicit_file_falls_back_to_defaults() {
    env::remove_var(TEST_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    let config = resolver().load(Some(&missing)).unwrap();
    assert_eq!(config, PlayerConfig::default());
}

#[test]
#[serial]
fn test_blank_environment_variable_is_ignored() {
    env::set_var(TEST_ENV_VAR, "   ");

    assert!(resolver().resolve_path(None).is_none());

    env::remove_var(TEST_ENV_VAR);
}

#[test]
#[serial]
fn test_malformed_file_is_config_error() {
    env::remove_var(TEST_ENV_VAR);
    let dir = TempDir::new().unwrap();
    let broken = write_config(&dir, "broken.toml", "tick_interval_ms = \"soon\"\n");

    let err = resolver().load(Some(&broken)).unwrap_err();
    match err {
        Error::Config(msg) => assert!(msg.contains("broken.toml"), "message: {msg}"),
        other => panic!("Expected Config error, got {other:?}"),
    }
}
