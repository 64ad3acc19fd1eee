// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that serde attributes cannot express:
//! non-zero limits, well-formed base URLs, and the `owner/repo` shape.

use crate::diagnostic::ConfigError;
use crate::model::CatalogConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &CatalogConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.fetch.concurrency == 0 {
        errors.push(ConfigError::Validation {
            message: "fetch.concurrency must be at least 1".to_string(),
        });
    }

    if config.fetch.timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "fetch.timeout_secs must be at least 1".to_string(),
        });
    }

    if config.fetch.user_agent.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "fetch.user_agent must not be empty".to_string(),
        });
    }

    for (key, value) in [
        ("github.api_base", &config.github.api_base),
        ("sources.cdn_base", &config.sources.cdn_base),
        ("sources.raw_base", &config.sources.raw_base),
        ("sources.release_base", &config.sources.release_base),
    ] {
        if !is_http_url(value) {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{value}` must be an http(s) URL"),
            });
        }
    }

    let repo_parts: Vec<&str> = config.github.catalogue_repo.split('/').collect();
    if repo_parts.len() != 2 || repo_parts.iter().any(|p| p.trim().is_empty()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "github.catalogue_repo `{}` must have the form `owner/repo`",
                config.github.catalogue_repo
            ),
        });
    }

    if config.github.catalogue_branch.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "github.catalogue_branch must not be empty".to_string(),
        });
    }

    if config.sources.mirrors.is_empty() {
        errors.push(ConfigError::Validation {
            message: "sources.mirrors must list at least one mirror".to_string(),
        });
    }

    if config.output.file_name.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "output.file_name must not be empty".to_string(),
        });
    }

    if !LOG_LEVELS.contains(&config.log.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level `{}` must be one of: {}",
                config.log.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.trim().is_empty())
}
