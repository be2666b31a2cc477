// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-empty paths,
//! positive intervals, parseable URLs and log levels.

use crate::diagnostic::ConfigError;
use crate::model::ColloquyConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ColloquyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of: {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.outbox.poll_interval_secs == 0 {
        fail("outbox.poll_interval_secs must be greater than 0".to_string());
    }

    if let Some(endpoint) = &config.broker.endpoint {
        let endpoint = endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            fail(format!(
                "broker.endpoint `{endpoint}` must be an http:// or https:// URL"
            ));
        }
    }

    if config.broker.topic.trim().is_empty() {
        fail("broker.topic must not be empty".to_string());
    }

    if config.broker.request_timeout_secs == 0 {
        fail("broker.request_timeout_secs must be greater than 0".to_string());
    }

    if config.intake.workers == 0 {
        fail("intake.workers must be at least 1".to_string());
    }

    if config.intake.poll_interval_ms == 0 {
        fail("intake.poll_interval_ms must be greater than 0".to_string());
    }

    if config.intake.lock_timeout_secs == 0 {
        fail("intake.lock_timeout_secs must be greater than 0".to_string());
    }

    if config.intake.max_attempts == 0 {
        fail("intake.max_attempts must be at least 1".to_string());
    }

    if config.gateway.enabled && config.gateway.host.parse::<std::net::IpAddr>().is_err() {
        fail(format!(
            "gateway.host `{}` is not a valid IP address",
            config.gateway.host
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
