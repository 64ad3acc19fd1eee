// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Release adapter: scrapes the latest version and last-update time from the
//! rendered plugin page.

use std::sync::{Arc, LazyLock};

use mcdr_catalog_core::time::normalize_timestamp;
use mcdr_catalog_core::ReleaseInfo;
use mcdr_catalog_fetch::Fetcher;
use regex::Regex;
use tracing::{debug, warn};

use crate::endpoints::SourceEndpoints;

static DATE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?").unwrap()
});

static PLAIN_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)+(?:[-+][0-9A-Za-z.+-]+)?$").unwrap());

static EMBEDDED_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+(?:\.\d+)?").unwrap());

/// Extracts a version from a release tag.
///
/// `1.2.3` and `v1.2.3` give `1.2.3`; `<plugin_id>-v2.0.0` gives `2.0.0`.
/// Otherwise the first `major.minor[.patch]` substring is returned, and a tag
/// with none is returned unchanged.
pub fn version_from_tag(tag: &str, plugin_id: &str) -> String {
    let tag = tag.trim();
    let mut rest = tag;
    if !plugin_id.is_empty()
        && let Some(stripped) = rest.strip_prefix(plugin_id)
    {
        rest = stripped.trim_start_matches(['-', '_', '@', '/']);
    }
    if let Some(stripped) = rest.strip_prefix(['v', 'V'])
        && stripped.starts_with(|c: char| c.is_ascii_digit())
    {
        rest = stripped;
    }
    if PLAIN_VERSION.is_match(rest) {
        return rest.to_string();
    }
    EMBEDDED_VERSION
        .find(tag)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| tag.to_string())
}

/// Extracts release info from a rendered page.
///
/// The version comes from the first `/plugin/<id>/release/<tag>` path. The
/// update time is the last date token in document order, not the greatest
/// one: the page streams chunks in rendering order.
pub fn extract_release_info(page: &str, plugin_id: &str) -> ReleaseInfo {
    let latest_version = release_path_pattern(plugin_id).and_then(|pattern| {
        pattern
            .captures(page)
            .and_then(|caps| caps.get(1))
            .map(|tag| version_from_tag(tag.as_str(), plugin_id))
    });

    let last_update_time = DATE_TOKEN
        .find_iter(page)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .find_map(|m| normalize_timestamp(m.as_str()));

    ReleaseInfo {
        latest_version,
        last_update_time,
    }
}

fn release_path_pattern(plugin_id: &str) -> Option<Regex> {
    let pattern = format!(r#"/plugin/{}/release/([^"'\\/?#\s<>]+)"#, regex::escape(plugin_id));
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(plugin = plugin_id, error = %e, "cannot build release pattern");
            None
        }
    }
}

/// Reads release information from the plugin page.
pub struct ReleaseAdapter {
    fetcher: Fetcher,
    endpoints: Arc<SourceEndpoints>,
}

impl ReleaseAdapter {
    pub fn new(fetcher: Fetcher, endpoints: Arc<SourceEndpoints>) -> Self {
        Self { fetcher, endpoints }
    }

    /// Fetches and scrapes the page. `None` if the page is unreachable or
    /// carries no matching tokens.
    pub async fn release_info(&self, plugin_id: &str) -> Option<ReleaseInfo> {
        let url = self.endpoints.release_url(plugin_id);
        let page = match self.fetcher.fetch(&url, self.endpoints.max_retries).await {
            Ok(page) => page,
            Err(e) => {
                warn!(plugin = plugin_id, url, error = %e, "release page unavailable");
                return None;
            }
        };
        let info = extract_release_info(&page, plugin_id);
        if info.is_empty() {
            debug!(plugin = plugin_id, "no release info on page");
            return None;
        }
        debug!(
            plugin = plugin_id,
            latest_version = info.latest_version.as_deref().unwrap_or("-"),
            last_update_time = info.last_update_time.as_deref().unwrap_or("-"),
            "release info scraped"
        );
        Some(info)
    }
}
