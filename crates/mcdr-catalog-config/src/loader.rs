// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./catalog.toml` > `~/.config/mcdr-catalog/catalog.toml`
//! > `/etc/mcdr-catalog/catalog.toml`, with environment variable overrides via
//! the `MCDR_CATALOG_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::CatalogConfig;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "MCDR_CATALOG_";

/// Local config file name, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "catalog.toml";

/// System-wide config file.
pub const SYSTEM_CONFIG_FILE: &str = "/etc/mcdr-catalog/catalog.toml";

/// The user config file under the XDG config directory, if one can be determined.
pub fn user_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mcdr-catalog").join(LOCAL_CONFIG_FILE))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mcdr-catalog/catalog.toml`
/// 3. `~/.config/mcdr-catalog/catalog.toml`
/// 4. `./catalog.toml`
/// 5. `MCDR_CATALOG_*` environment variables
pub fn load_config() -> Result<CatalogConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no environment).
pub fn load_config_from_str(toml_content: &str) -> Result<CatalogConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CatalogConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file path with env var overrides.
///
/// The XDG hierarchy is skipped entirely.
pub fn load_config_from_path(path: &Path) -> Result<CatalogConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CatalogConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for hierarchy loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CatalogConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_FILE))
        .merge(Toml::file(user_config_file().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Map `MCDR_CATALOG_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys themselves
/// contain underscores: `MCDR_CATALOG_FETCH_MAX_RETRIES` must become
/// `fetch.max_retries`, not `fetch.max.retries`.
fn env_provider() -> Env {
    Env::prefixed(ENV_PREFIX).map(|key| {
        let key_str = key.as_str();
        let mapped = ["fetch", "github", "sources", "output", "log"]
            .iter()
            .find_map(|section| {
                key_str
                    .strip_prefix(section)
                    .and_then(|rest| rest.strip_prefix('_'))
                    .map(|rest| format!("{section}.{rest}"))
            })
            .unwrap_or_else(|| key_str.to_string());
        mapped.into()
    })
}
