// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Telexport server.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Telexport configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelexportConfig {
    /// HTTP tool surface settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Telegram MTProto session settings.
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// History fetcher limits.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Wait controller / retry policy.
    #[serde(default)]
    pub retry: RetryConfig,

    /// NDJSON export artifact settings.
    #[serde(default)]
    pub export: ExportConfig,
}

/// HTTP tool surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token guarding the tool endpoints. `None` disables auth
    /// (bind to loopback only in that case).
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8474
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Telegram MTProto session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TelegramConfig {
    /// Telegram API id from my.telegram.org. `None` disables the live
    /// provider (only useful for tests).
    #[serde(default)]
    pub api_id: Option<i32>,

    /// Telegram API hash paired with `api_id`.
    #[serde(default)]
    pub api_hash: Option<String>,

    /// Path to the persisted MTProto session file. The session must
    /// already be authorized; the server never drives a login flow.
    #[serde(default = "default_session_path")]
    pub session_path: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_id: None,
            api_hash: None,
            session_path: default_session_path(),
        }
    }
}

fn default_session_path() -> String {
    "telexport.session".to_string()
}

/// History fetcher limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Upper bound on a caller's `page_size` (capped at 100).
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Windows larger than this many messages divert to an NDJSON artifact.
    #[serde(default = "default_export_threshold")]
    pub export_threshold: usize,

    /// The fetcher reads `page_size x N` raw messages per provider batch
    /// to offset filter-driven skips.
    #[serde(default = "default_inner_read_multiplier")]
    pub inner_read_multiplier: usize,

    /// Maximum provider batches consumed per call before returning a
    /// partial page. Bounds the cost of pathological filters.
    #[serde(default = "default_scan_budget_batches")]
    pub scan_budget_batches: usize,

    /// Hard cap on messages collected into one export artifact.
    #[serde(default = "default_max_export_messages")]
    pub max_export_messages: usize,

    /// Enable the bounded resolver cache.
    #[serde(default)]
    pub resolver_cache_enabled: bool,

    /// Resolver cache capacity (entries).
    #[serde(default = "default_resolver_cache_size")]
    pub resolver_cache_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_page_size: default_max_page_size(),
            export_threshold: default_export_threshold(),
            inner_read_multiplier: default_inner_read_multiplier(),
            scan_budget_batches: default_scan_budget_batches(),
            max_export_messages: default_max_export_messages(),
            resolver_cache_enabled: false,
            resolver_cache_size: default_resolver_cache_size(),
        }
    }
}

fn default_max_page_size() -> usize {
    100
}

fn default_export_threshold() -> usize {
    500
}

fn default_inner_read_multiplier() -> usize {
    2
}

fn default_scan_budget_batches() -> usize {
    8
}

fn default_max_export_messages() -> usize {
    10_000
}

fn default_resolver_cache_size() -> usize {
    256
}

/// Wait controller / retry policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Provider-demanded waits up to this many seconds are slept through;
    /// beyond it, the call surfaces `RATE_LIMITED` with a resumable cursor.
    #[serde(default = "default_wait_budget_seconds")]
    pub wait_budget_seconds: u64,

    /// Upper bound on attempts per provider call.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base backoff for transient failures, doubled per attempt.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Proportional jitter applied to sleeps, in `[0, 1]`.
    #[serde(default = "default_jitter_ratio")]
    pub jitter_ratio: f64,

    /// Per-provider-call deadline.
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            wait_budget_seconds: default_wait_budget_seconds(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            jitter_ratio: default_jitter_ratio(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

fn default_wait_budget_seconds() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    250
}

fn default_jitter_ratio() -> f64 {
    0.1
}

fn default_request_timeout_seconds() -> u64 {
    30
}

/// NDJSON export artifact configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExportConfig {
    /// Directory holding artifact files. Created on startup if missing.
    #[serde(default = "default_export_dir")]
    pub dir: String,

    /// Artifact lifetime before the sweeper deletes it.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,

    /// Interval between sweeper passes.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            ttl_hours: default_ttl_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_export_dir() -> String {
    std::env::temp_dir()
        .join("telexport-exports")
        .to_string_lossy()
        .into_owned()
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_sweep_interval_secs() -> u64 {
    300
}
