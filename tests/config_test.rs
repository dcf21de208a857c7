//! Integration tests for Settings loading from an explicit settings file.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use config::Environment;
use tempfile::TempDir;

use bootscrub::application::ApplicationError;
use bootscrub::config::{Settings, ENV_PREFIX};
use bootscrub::domain::ConfigPath;

fn env_from(vars: &[(&str, &str)]) -> Environment {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .source(Some(map))
}

#[test]
fn given_settings_file_when_load_then_overrides_defaults() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bootscrub.toml");
    fs::write(
        &file,
        r#"
config_path = "/tmp/router/config.boot"
keep_interface = "eth3"
backup = true
"#,
    )
    .unwrap();

    // Act
    let settings = Settings::load_with_env(Some(&file), env_from(&[])).unwrap();

    // Assert
    assert_eq!(settings.config_path, PathBuf::from("/tmp/router/config.boot"));
    assert_eq!(settings.keep_interface, "eth3");
    assert!(settings.backup);
    // Not specified in the file: defaults
    assert_eq!(settings.hw_id_leaf, "hw-id");
    assert_eq!(
        settings.policy().interfaces_path,
        ConfigPath::from(["interfaces", "ethernet"])
    );
}

#[test]
fn given_settings_file_and_env_when_load_then_env_wins() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bootscrub.toml");
    fs::write(&file, "keep_interface = \"eth3\"\n").unwrap();

    let settings = Settings::load_with_env(
        Some(&file),
        env_from(&[("BOOTSCRUB_KEEP_INTERFACE", "eth5")]),
    )
    .unwrap();

    assert_eq!(settings.keep_interface, "eth5");
}

#[test]
fn given_missing_settings_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("absent.toml");

    let result = Settings::load_with_env(Some(&file), env_from(&[]));

    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("absent.toml"));
}

#[test]
fn given_unknown_key_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bootscrub.toml");
    fs::write(&file, "keep_iface = \"eth0\"\n").unwrap();

    let result = Settings::load_with_env(Some(&file), env_from(&[]));

    assert!(result.is_err(), "typos should not be silently ignored");
}

#[test]
fn given_env_var_in_config_path_when_load_then_expanded() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bootscrub.toml");
    fs::write(&file, "config_path = \"$HOME/config.boot\"\n").unwrap();

    let settings = Settings::load_with_env(Some(&file), env_from(&[])).unwrap();

    let home = std::env::var("HOME").expect("HOME should be set");
    assert_eq!(settings.config_path, PathBuf::from(home).join("config.boot"));
}

#[test]
fn given_settings_when_rendered_to_toml_then_loads_back() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bootscrub.toml");
    let original = Settings {
        keep_interface: "eth1".into(),
        ..Settings::default()
    };
    fs::write(&file, original.to_toml().unwrap()).unwrap();

    let loaded = Settings::load_with_env(Some(&file), env_from(&[])).unwrap();

    assert_eq!(loaded, original);
}

#[test]
fn given_root_interfaces_path_in_settings_file_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bootscrub.toml");
    fs::write(&file, "interfaces_path = \"/\"\n").unwrap();

    let result = Settings::load_with_env(Some(&file), env_from(&[]));

    match result {
        Err(ApplicationError::Config { message }) => {
            assert!(message.contains("interfaces_path"), "message: {message}");
        }
        other => panic!("expected config error, got {other:?}"),
    }
}
