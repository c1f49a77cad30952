// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for configuration loading, precedence, and diagnostics.

use telexport_config::{
    figment_to_config_errors, load_config_from_str, validate_config, ConfigError, TelexportConfig,
};

#[test]
fn empty_input_yields_full_defaults() {
    let config = load_config_from_str("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.history.max_page_size, 100);
    assert_eq!(config.history.export_threshold, 500);
    assert_eq!(config.history.inner_read_multiplier, 2);
    assert_eq!(config.retry.wait_budget_seconds, 60);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.base_backoff_ms, 250);
    assert_eq!(config.export.ttl_hours, 24);
    assert!(!config.history.resolver_cache_enabled);
    assert!(config.server.bearer_token.is_none());
    assert!(validate_config(&config).is_ok());
}

#[test]
fn full_toml_round_trip() {
    let config = load_config_from_str(
        r#"
[server]
host = "0.0.0.0"
port = 9090
bearer_token = "secret-token"
log_level = "debug"

[telegram]
api_id = 12345
api_hash = "0123456789abcdef"
session_path = "/var/lib/telexport/telexport.session"

[history]
max_page_size = 50
export_threshold = 200
inner_read_multiplier = 3
resolver_cache_enabled = true
resolver_cache_size = 64

[retry]
wait_budget_seconds = 30
max_attempts = 5

[export]
dir = "/var/lib/telexport/exports"
ttl_hours = 6
"#,
    )
    .unwrap();

    assert_eq!(config.server.port, 9090);
    assert_eq!(config.server.bearer_token.as_deref(), Some("secret-token"));
    assert_eq!(config.telegram.api_id, Some(12345));
    assert_eq!(config.history.max_page_size, 50);
    assert_eq!(config.history.resolver_cache_size, 64);
    assert_eq!(config.retry.wait_budget_seconds, 30);
    assert_eq!(config.export.ttl_hours, 6);
    assert!(validate_config(&config).is_ok());
}

#[test]
fn unknown_section_key_is_rejected_with_suggestion() {
    let err = load_config_from_str(
        r#"
[retry]
wait_buget_seconds = 10
"#,
    )
    .unwrap_err();

    let errors = figment_to_config_errors(err);
    let suggestion = errors.iter().find_map(|e| match e {
        ConfigError::UnknownKey { suggestion, .. } => suggestion.clone(),
        _ => None,
    });
    assert_eq!(suggestion.as_deref(), Some("wait_budget_seconds"));
}

#[test]
fn wrong_type_is_rejected() {
    let result = load_config_from_str(
        r#"
[server]
port = "not-a-port"
"#,
    );
    assert!(result.is_err());
}

#[test]
fn deny_unknown_fields_applies_to_every_section() {
    for section in ["server", "telegram", "history", "retry", "export"] {
        let toml = format!("[{section}]\nbogus_key = 1\n");
        assert!(
            load_config_from_str(&toml).is_err(),
            "section [{section}] accepted an unknown key"
        );
    }
}

#[test]
fn toml_crate_parses_model_directly() {
    // The model must stay deserializable outside figment too (round-trip
    // through plain toml, as used by the `check` subcommand's output).
    let config: TelexportConfig = toml::from_str(
        r#"
[history]
scan_budget_batches = 4
max_export_messages = 2000
"#,
    )
    .unwrap();
    assert_eq!(config.history.scan_budget_batches, 4);
    assert_eq!(config.history.max_export_messages, 2000);
}
