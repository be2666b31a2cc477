// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./colloquy.toml` > `~/.config/colloquy/colloquy.toml`
//! > `/etc/colloquy/colloquy.toml` with environment variable overrides via the
//! `COLLOQUY_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ColloquyConfig;

/// Config sections that environment variables may address.
const SECTIONS: &[&str] = &[
    "service",
    "storage",
    "outbox",
    "broker",
    "intake",
    "gateway",
    "prometheus",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/colloquy/colloquy.toml` (system-wide)
/// 3. `~/.config/colloquy/colloquy.toml` (user XDG config)
/// 4. `./colloquy.toml` (local directory)
/// 5. `COLLOQUY_*` environment variables
pub fn load_config() -> Result<ColloquyConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ColloquyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ColloquyConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from one explicit file with env var overrides.
///
/// Backs the `--config <path>` flag; the XDG hierarchy is skipped.
pub fn load_config_from_path(path: &Path) -> Result<ColloquyConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ColloquyConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ColloquyConfig::default()))
        .merge(Toml::file("/etc/colloquy/colloquy.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("colloquy/colloquy.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("colloquy.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `COLLOQUY_<SECTION>_<KEY>` to `section.key`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// `COLLOQUY_STORAGE_BUSY_TIMEOUT_MS` maps to `storage.busy_timeout_ms`.
fn env_provider() -> Env {
    Env::prefixed("COLLOQUY_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
