// SPDX-FileCopyrightText: 2026 Telexport Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the Telexport server.
//!
//! Layered TOML + environment loading via Figment, with
//! `deny_unknown_fields` models, collect-all semantic validation, and
//! miette diagnostics with "did you mean?" suggestions.

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

pub use diagnostic::{figment_to_config_errors, render_errors, ConfigError};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::TelexportConfig;
pub use validation::validate_config;
