// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Colloquy chat backend.
//!
//! TOML parsing with strict key checking (`deny_unknown_fields`), XDG file
//! hierarchy lookup, `COLLOQUY_*` environment overrides and miette
//! diagnostics with typo suggestions.
//!
//! ```no_run
//! use colloquy_config::load_and_validate;
//!
//! let config = load_and_validate(None).expect("config errors");
//! println!("listening on {}:{}", config.gateway.host, config.gateway.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::ColloquyConfig;

/// Load and validate configuration.
///
/// With `path` set only that file (plus env overrides) is read, otherwise the
/// XDG hierarchy is merged. Figment errors become miette diagnostics.
pub fn load_and_validate(path: Option<&Path>) -> Result<ColloquyConfig, Vec<ConfigError>> {
    let loaded = match path {
        Some(p) => loader::load_config_from_path(p),
        None => loader::load_config(),
    };
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = match path {
                Some(p) => read_source(p).into_iter().collect(),
                None => collect_toml_sources(),
            };
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<ColloquyConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Serialize the effective configuration back to TOML.
pub fn render_effective(config: &ColloquyConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}

fn read_source(path: &Path) -> Option<(String, String)> {
    std::fs::read_to_string(path)
        .ok()
        .map(|content| (path.display().to_string(), content))
}

/// Source files of the hierarchy, for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut candidates = vec![std::path::PathBuf::from("/etc/colloquy/colloquy.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("colloquy/colloquy.toml"));
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("colloquy.toml"));
    }
    candidates.iter().filter_map(|p| read_source(p)).collect()
}
