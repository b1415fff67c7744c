//! Unit tests for configuration loading
//!
//! Covers:
//! - Missing default config file falls back to an empty config
//! - Explicit config path must exist
//! - Command template tables parse into program + args
//! - Unknown keys are rejected

use remplay_common::config::{load_toml_config, parse_toml_config, CompiledDefaults};
use remplay_common::CommandTemplate;
use std::io::Write;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.source_path.as_os_str().is_empty());
    assert_eq!(defaults.port, 3003);
    assert_eq!(defaults.bind, "0.0.0.0");
}

#[test]
fn test_full_config_parses() {
    let config = parse_toml_config(
        r#"
        source_path = "/srv/music"
        port = 8080
        password = "hunter2"
        no_tunnel = true

        [commands.player]
        program = "mpv"
        args = ["--no-video", "{file}"]

        [commands.volume]
        program = "pactl"
        args = ["set-sink-volume", "@DEFAULT_SINK@", "{volume}%"]
        "#,
    )
    .expect("config should parse");

    assert_eq!(config.source_path, Some(PathBuf::from("/srv/music")));
    assert_eq!(config.port, Some(8080));
    assert_eq!(config.password.as_deref(), Some("hunter2"));
    assert_eq!(config.no_tunnel, Some(true));
    assert!(config.bind.is_none());
    assert_eq!(
        config.commands.player,
        Some(CommandTemplate::new("mpv", &["--no-video", "{file}"]))
    );
    assert!(config.commands.list.is_none());
}

#[test]
fn test_empty_config_parses() {
    let config = parse_toml_config("").expect("empty config should parse");
    assert!(config.source_path.is_none());
    assert!(config.password.is_none());
    assert!(config.commands.player.is_none());
}

#[test]
fn test_unknown_key_rejected() {
    assert!(parse_toml_config("pasword = \"typo\"").is_err());
}

#[test]
fn test_template_args_default_to_empty() {
    let config = parse_toml_config("[commands.tunnel]\nprogram = \"true\"").unwrap();
    let tunnel = config.commands.tunnel.unwrap();
    assert_eq!(tunnel.program, "true");
    assert!(tunnel.args.is_empty());
}

#[test]
fn test_load_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = 4000").unwrap();

    let config = load_toml_config(Some(file.path())).expect("should load");
    assert_eq!(config.port, Some(4000));
}

#[test]
fn test_load_missing_explicit_file_is_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(load_toml_config(Some(&missing)).is_err());
}

#[test]
fn test_load_invalid_file_is_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "port = \"not a number\"").unwrap();

    let err = load_toml_config(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("Invalid config file"));
}
