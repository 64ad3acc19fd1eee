// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Top-level catalog aggregator configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to the public MCDReforged endpoints.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Request pacing, retry, and timeout settings.
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Repository-content API and catalogue index location.
    #[serde(default)]
    pub github: GithubConfig,

    /// Mirror and release page endpoints.
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Where the catalog file lives.
    #[serde(default)]
    pub output: OutputConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Outbound request settings shared by every source.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt on transient failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum number of requests in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Base delay for the exponential retry backoff, in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            concurrency: default_concurrency(),
            backoff_base_ms: default_backoff_base_ms(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_retries() -> u32 {
    3
}

fn default_concurrency() -> usize {
    10
}

fn default_backoff_base_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    "MCDReforged-Plugin-Scraper".to_string()
}

/// Repository-content API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GithubConfig {
    /// Bearer token. `None` falls back to the `GITHUB_TOKEN` environment variable.
    #[serde(default)]
    pub token: Option<String>,

    /// Base URL of the repository-content API.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// `owner/repo` of the catalogue index repository.
    #[serde(default = "default_catalogue_repo")]
    pub catalogue_repo: String,

    /// Branch of the catalogue index repository.
    #[serde(default = "default_catalogue_branch")]
    pub catalogue_branch: String,

    /// Directory inside the catalogue repository holding one folder per plugin.
    #[serde(default = "default_catalogue_path")]
    pub catalogue_path: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base: default_api_base(),
            catalogue_repo: default_catalogue_repo(),
            catalogue_branch: default_catalogue_branch(),
            catalogue_path: default_catalogue_path(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.github.com".to_string()
}

fn default_catalogue_repo() -> String {
    "MCDReforged/PluginCatalogue".to_string()
}

fn default_catalogue_branch() -> String {
    "master".to_string()
}

fn default_catalogue_path() -> String {
    "plugins".to_string()
}

/// A raw-content mirror for files inside plugin repositories.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mirror {
    /// `cdn.jsdelivr.net/gh/<owner>/<repo>@<branch>/<path>`
    Jsdelivr,
    /// `raw.githubusercontent.com/<owner>/<repo>/<branch>/<path>`
    Raw,
}

/// Endpoints of the content mirrors and the release page.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    /// jsDelivr GitHub base URL.
    #[serde(default = "default_cdn_base")]
    pub cdn_base: String,

    /// Raw-content base URL.
    #[serde(default = "default_raw_base")]
    pub raw_base: String,

    /// Mirrors to try, in order, for each candidate metadata location.
    #[serde(default = "default_mirrors")]
    pub mirrors: Vec<Mirror>,

    /// Base URL of the rendered plugin page; the plugin id is appended.
    #[serde(default = "default_release_base")]
    pub release_base: String,

    /// Query string appended to the plugin page URL.
    #[serde(default = "default_release_query")]
    pub release_query: String,

    /// Whether to read license, readme, and download statistics from the API.
    #[serde(default = "default_fetch_stats")]
    pub fetch_stats: bool,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            cdn_base: default_cdn_base(),
            raw_base: default_raw_base(),
            mirrors: default_mirrors(),
            release_base: default_release_base(),
            release_query: default_release_query(),
            fetch_stats: default_fetch_stats(),
        }
    }
}

fn default_cdn_base() -> String {
    "https://cdn.jsdelivr.net/gh".to_string()
}

fn default_raw_base() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_mirrors() -> Vec<Mirror> {
    vec![Mirror::Jsdelivr, Mirror::Raw]
}

fn default_release_base() -> String {
    "https://mcdreforged.com/zh-CN/plugin".to_string()
}

fn default_release_query() -> String {
    "_rsc=1rz10".to_string()
}

fn default_fetch_stats() -> bool {
    true
}

/// Catalog file location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory holding the catalog file.
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Catalog file name inside `dir`.
    #[serde(default = "default_file_name")]
    pub file_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            file_name: default_file_name(),
        }
    }
}

impl OutputConfig {
    /// Full path of the catalog file.
    pub fn catalog_path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_file_name() -> String {
    "plugins.json".to_string()
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
