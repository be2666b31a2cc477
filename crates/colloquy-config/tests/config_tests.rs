// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the Colloquy configuration system.

use colloquy_config::diagnostic::ConfigError;
use colloquy_config::model::{ColloquyConfig, LogFormat};
use colloquy_config::{
    load_and_validate, load_and_validate_str, load_config_from_str, render_effective,
};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[service]
name = "colloquy-test"
log_level = "debug"
log_format = "json"
shutdown_timeout_secs = 5

[storage]
database_path = "/tmp/colloquy-test.db"
wal_mode = false
busy_timeout_ms = 250

[outbox]
enabled = false
poll_interval_secs = 2

[broker]
endpoint = "http://127.0.0.1:9000/events"
topic = "unread"
request_timeout_secs = 3

[intake]
workers = 4
poll_interval_ms = 100
lock_timeout_secs = 60
max_attempts = 3

[gateway]
host = "0.0.0.0"
port = 8080

[prometheus]
enabled = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.service.name, "colloquy-test");
    assert_eq!(config.service.log_format, LogFormat::Json);
    assert_eq!(config.storage.database_path, "/tmp/colloquy-test.db");
    assert!(!config.storage.wal_mode);
    assert_eq!(config.storage.busy_timeout_ms, 250);
    assert!(!config.outbox.enabled);
    assert_eq!(config.outbox.poll_interval_secs, 2);
    assert_eq!(
        config.broker.endpoint.as_deref(),
        Some("http://127.0.0.1:9000/events")
    );
    assert_eq!(config.broker.topic, "unread");
    assert_eq!(config.intake.workers, 4);
    assert_eq!(config.intake.max_attempts, 3);
    assert_eq!(config.gateway.port, 8080);
    assert!(config.prometheus.enabled);
}

#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults are valid");
    assert_eq!(config.outbox.poll_interval_secs, 5);
    assert_eq!(config.broker.topic, "counter-commands");
    assert_eq!(config.intake.workers, 1);
    assert_eq!(config.gateway.host, "127.0.0.1");
    assert!(config.broker.endpoint.is_none());
    assert!(!config.prometheus.enabled);
}

#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[outbox]
poll_intervl_secs = 3
"#;
    let errors = load_and_validate_str(toml).expect_err("unknown key must fail");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "poll_intervl_secs");
            assert_eq!(suggestion.as_deref(), Some("poll_interval_secs"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_section_is_rejected() {
    let errors = load_and_validate_str("[kafka]\nbrokers = []\n").expect_err("must fail");
    assert!(matches!(errors[0], ConfigError::UnknownKey { .. }));
}

#[test]
fn wrong_type_is_reported() {
    let errors =
        load_and_validate_str("[gateway]\nport = \"eighty\"\n").expect_err("must fail");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn validation_errors_surface_after_parse() {
    let toml = r#"
[outbox]
poll_interval_secs = 0

[intake]
workers = 0
"#;
    let errors = load_and_validate_str(toml).expect_err("must fail validation");
    assert_eq!(errors.len(), 2);
    assert!(
        errors
            .iter()
            .all(|e| matches!(e, ConfigError::Validation { .. }))
    );
}

#[test]
fn explicit_path_and_env_override() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "custom.toml",
            r#"
[broker]
endpoint = "http://downstream:8080/hook"

[outbox]
poll_interval_secs = 9
"#,
        )?;
        jail.set_env("COLLOQUY_OUTBOX_POLL_INTERVAL_SECS", "1");
        jail.set_env("COLLOQUY_STORAGE_DATABASE_PATH", "/tmp/from-env.db");

        let config = load_and_validate(Some(std::path::Path::new("custom.toml")))
            .map_err(|e| format!("{e:?}"))?;
        assert_eq!(config.outbox.poll_interval_secs, 1);
        assert_eq!(config.storage.database_path, "/tmp/from-env.db");
        assert_eq!(
            config.broker.endpoint.as_deref(),
            Some("http://downstream:8080/hook")
        );
        Ok(())
    });
}

#[test]
fn effective_config_round_trips() {
    let config = ColloquyConfig::default();
    let rendered = render_effective(&config).expect("serializes");
    let reparsed = load_config_from_str(&rendered).expect("reparses");
    assert_eq!(reparsed.gateway.port, config.gateway.port);
    assert_eq!(reparsed.storage.database_path, config.storage.database_path);
}
