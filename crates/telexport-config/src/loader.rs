// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./telexport.toml` >
//! `~/.config/telexport/telexport.toml` > `/etc/telexport/telexport.toml`,
//! with environment variable overrides via the `TELEXPORT_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::TelexportConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/telexport/telexport.toml` (system-wide)
/// 3. `~/.config/telexport/telexport.toml` (user XDG config)
/// 4. `./telexport.toml` (local directory)
/// 5. `TELEXPORT_*` environment variables
pub fn load_config() -> Result<TelexportConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<TelexportConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TelexportConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<TelexportConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(TelexportConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the default loading chain.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(TelexportConfig::default()))
        .merge(Toml::file("/etc/telexport/telexport.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("telexport/telexport.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("telexport.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `TELEXPORT_RETRY_WAIT_BUDGET_SECONDS`
/// must map to `retry.wait_budget_seconds`, not `retry.wait.budget.seconds`.
fn env_provider() -> Env {
    Env::prefixed("TELEXPORT_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("server_", "server.", 1)
            .replacen("telegram_", "telegram.", 1)
            .replacen("history_", "history.", 1)
            .replacen("retry_", "retry.", 1)
            .replacen("export_", "export.", 1);
        mapped.into()
    })
}
