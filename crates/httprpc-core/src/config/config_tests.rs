#![allow(non_snake_case)]

use super::*;

#[test]
fn ServerConfig___default___has_expected_values() {
    let config = ServerConfig::default();

    assert_eq!(config.log_level, "info");
    assert!(config.require_post);
    assert!(config.default_codec_for_missing_content_type);
    assert!(config.nosniff);
}

#[test]
fn ServerConfig___from_json___parses_log_level() {
    let json = r#"{"log_level": "debug"}"#;

    let config = ServerConfig::from_json(json.as_bytes()).unwrap();

    assert_eq!(config.log_level, "debug");
    assert!(config.require_post);
}

#[test]
fn ServerConfig___from_empty_bytes___returns_defaults() {
    let config = ServerConfig::from_json(&[]).unwrap();

    assert_eq!(config, ServerConfig::default());
}

#[test]
fn ServerConfig___from_json_invalid___returns_json_error() {
    let result = ServerConfig::from_json(b"{not json");

    assert!(matches!(result, Err(ConfigError::Json(_))));
}

#[test]
fn ServerConfig___from_toml_str___parses_all_fields() {
    let text = r#"
        log_level = "warn"
        require_post = false
        default_codec_for_missing_content_type = false
        nosniff = false
    "#;

    let config = ServerConfig::from_toml_str(text).unwrap();

    assert_eq!(config.log_level, "warn");
    assert!(!config.require_post);
    assert!(!config.default_codec_for_missing_content_type);
    assert!(!config.nosniff);
}

#[test]
fn ServerConfig___from_toml_str_empty___returns_defaults() {
    let config = ServerConfig::from_toml_str("").unwrap();

    assert_eq!(config, ServerConfig::default());
}

#[test]
fn ServerConfig___from_toml_str_wrong_type___returns_toml_error() {
    let result = ServerConfig::from_toml_str("require_post = \"yes\"");

    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn ServerConfig___log_level___parses_configured_level() {
    let config = ServerConfig {
        log_level: "Trace".to_string(),
        ..ServerConfig::default()
    };

    assert_eq!(config.log_level().unwrap(), LogLevel::Trace);
}

#[test]
fn ServerConfig___log_level_unknown___returns_error() {
    let config = ServerConfig {
        log_level: "loud".to_string(),
        ..ServerConfig::default()
    };

    let result = config.log_level();

    assert!(matches!(result, Err(ConfigError::InvalidLogLevel(level)) if level == "loud"));
}
