// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: bounds on page sizes and budgets, paired credentials,
//! sane jitter ratios.

use crate::diagnostic::ConfigError;
use crate::model::TelexportConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &TelexportConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    if config.server.port == 0 {
        errors.push(ConfigError::Validation {
            message: "server.port must be non-zero".to_string(),
        });
    }

    // api_id and api_hash only make sense as a pair.
    match (&config.telegram.api_id, &config.telegram.api_hash) {
        (Some(_), None) => errors.push(ConfigError::Validation {
            message: "telegram.api_id is set but telegram.api_hash is missing".to_string(),
        }),
        (None, Some(_)) => errors.push(ConfigError::Validation {
            message: "telegram.api_hash is set but telegram.api_id is missing".to_string(),
        }),
        _ => {}
    }

    if config.telegram.session_path.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "telegram.session_path must not be empty".to_string(),
        });
    }

    let h = &config.history;
    if h.max_page_size < 1 || h.max_page_size > 100 {
        errors.push(ConfigError::Validation {
            message: format!(
                "history.max_page_size must be within [1, 100], got {}",
                h.max_page_size
            ),
        });
    }

    if h.export_threshold < 1 {
        errors.push(ConfigError::Validation {
            message: "history.export_threshold must be at least 1".to_string(),
        });
    }

    if h.inner_read_multiplier < 1 {
        errors.push(ConfigError::Validation {
            message: "history.inner_read_multiplier must be at least 1".to_string(),
        });
    }

    if h.scan_budget_batches < 1 {
        errors.push(ConfigError::Validation {
            message: "history.scan_budget_batches must be at least 1".to_string(),
        });
    }

    if h.max_export_messages < h.export_threshold {
        errors.push(ConfigError::Validation {
            message: format!(
                "history.max_export_messages ({}) must not be below history.export_threshold ({})",
                h.max_export_messages, h.export_threshold
            ),
        });
    }

    if h.resolver_cache_enabled && h.resolver_cache_size < 1 {
        errors.push(ConfigError::Validation {
            message: "history.resolver_cache_size must be at least 1 when the cache is enabled"
                .to_string(),
        });
    }

    let r = &config.retry;
    if r.max_attempts < 1 {
        errors.push(ConfigError::Validation {
            message: "retry.max_attempts must be at least 1".to_string(),
        });
    }

    if !(0.0..=1.0).contains(&r.jitter_ratio) {
        errors.push(ConfigError::Validation {
            message: format!(
                "retry.jitter_ratio must be within [0.0, 1.0], got {}",
                r.jitter_ratio
            ),
        });
    }

    if r.request_timeout_seconds == 0 {
        errors.push(ConfigError::Validation {
            message: "retry.request_timeout_seconds must be non-zero".to_string(),
        });
    }

    if config.export.dir.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "export.dir must not be empty".to_string(),
        });
    }

    if config.export.ttl_hours == 0 {
        errors.push(ConfigError::Validation {
            message: "export.ttl_hours must be non-zero".to_string(),
        });
    }

    if config.export.sweep_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "export.sweep_interval_secs must be non-zero".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = TelexportConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn oversized_page_size_fails() {
        let mut config = TelexportConfig::default();
        config.history.max_page_size = 250;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("max_page_size"))
        ));
    }

    #[test]
    fn unpaired_api_credentials_fail() {
        let mut config = TelexportConfig::default();
        config.telegram.api_id = Some(12345);
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("api_hash"))
        ));
    }

    #[test]
    fn jitter_out_of_range_fails() {
        let mut config = TelexportConfig::default();
        config.retry.jitter_ratio = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("jitter_ratio"))
        ));
    }

    #[test]
    fn export_cap_below_threshold_fails() {
        let mut config = TelexportConfig::default();
        config.history.export_threshold = 500;
        config.history.max_export_messages = 100;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("max_export_messages"))
        ));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = TelexportConfig::default();
        config.server.port = 0;
        config.export.ttl_hours = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
