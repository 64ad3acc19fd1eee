// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the source adapters, the merge engine, and the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::normalize::{self, GITHUB_PROFILE_BASE};

/// Placeholder version used when no source has ever declared one.
pub const DEFAULT_VERSION: &str = "0.0.0";

/// A plugin author with an optional profile link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub link: Option<String>,
}

impl Author {
    /// Builds an author from a bare string.
    ///
    /// Handles become `https://github.com/<name>` links; strings that already
    /// look like URLs become the link and their last path segment the name.
    pub fn from_bare_name(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if normalize::looks_like_url(raw) {
            let name = raw
                .split('/')
                .rev()
                .find(|seg| !seg.is_empty())
                .unwrap_or(raw)
                .to_string();
            return Some(Author {
                name,
                link: Some(raw.to_string()),
            });
        }
        Some(Author {
            name: raw.to_string(),
            link: Some(format!("{GITHUB_PROFILE_BASE}{raw}")),
        })
    }
}

/// Per-locale description as recovered from one source. Either side may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedText {
    pub en_us: Option<String>,
    pub zh_cn: Option<String>,
}

impl LocalizedText {
    /// Renders absent locales as empty strings.
    pub fn into_description(self) -> Description {
        Description {
            en_us: self.en_us.unwrap_or_default(),
            zh_cn: self.zh_cn.unwrap_or_default(),
        }
    }
}

/// Persisted bilingual description. Both keys are always present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    #[serde(default, deserialize_with = "normalize::null_as_default")]
    pub en_us: String,
    #[serde(default, deserialize_with = "normalize::null_as_default")]
    pub zh_cn: String,
}

/// One entry of the catalogue index (`plugin_info.json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PluginDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub related_path: Option<String>,
    #[serde(default)]
    pub disable: Option<bool>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default, deserialize_with = "normalize::authors_opt")]
    pub authors: Option<Vec<Author>>,
    #[serde(default, deserialize_with = "normalize::description_opt")]
    pub description: LocalizedText,
}

impl PluginDescriptor {
    /// Returns true if the index marks this plugin as excluded.
    pub fn is_disabled(&self) -> bool {
        self.disable.unwrap_or(false)
    }

    /// Converts the descriptor into the index fragment used by the merge engine.
    pub fn to_fragment(&self) -> SourceFragment {
        SourceFragment {
            id: self.id.clone().filter(|id| !id.trim().is_empty()),
            name: self.name.clone(),
            description: self.description.clone(),
            labels: self.labels.clone(),
            authors: self.authors.clone(),
            repository: self.repository.clone(),
            branch: self.branch.clone(),
            related_path: self.related_path.clone(),
            ..SourceFragment::default()
        }
    }

    /// Builds `<repository>/tree/<branch>[/<related_path>]`, or `None` without a repository.
    pub fn repository_url(&self) -> Option<String> {
        tree_url(
            self.repository.as_deref()?,
            self.branch.as_deref(),
            self.related_path.as_deref(),
        )
    }
}

/// Canonical browse URL of a plugin inside its repository.
///
/// The branch defaults to `master`; the relative path is normalized with
/// [`normalize_related_path`].
pub fn tree_url(repository: &str, branch: Option<&str>, related_path: Option<&str>) -> Option<String> {
    let repository = repository.trim().trim_end_matches('/');
    if repository.is_empty() {
        return None;
    }
    let branch = branch.map(str::trim).filter(|b| !b.is_empty()).unwrap_or("master");
    let mut url = format!("{repository}/tree/{branch}");
    if let Some(path) = related_path.and_then(normalize_related_path) {
        url.push('/');
        url.push_str(&path);
    }
    Some(url)
}

/// Normalizes a repository-relative path: `\` becomes `/`, `.` and empty
/// segments are dropped. Returns `None` for the repository root.
pub fn normalize_related_path(raw: &str) -> Option<String> {
    let replaced = raw.trim().replace('\\', "/");
    let segments: Vec<&str> = replaced
        .split('/')
        .filter(|seg| !seg.is_empty() && *seg != ".")
        .collect();
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Statistics read from the repository-content API. Each stat is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryStats {
    pub downloads: Option<u64>,
    pub license: Option<String>,
    pub license_url: Option<String>,
    pub readme_url: Option<String>,
}

/// Partial plugin metadata recovered from one source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFragment {
    pub id: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub description: LocalizedText,
    pub dependencies: Option<BTreeMap<String, String>>,
    pub labels: Option<Vec<String>>,
    pub authors: Option<Vec<Author>>,
    pub repository: Option<String>,
    pub branch: Option<String>,
    pub related_path: Option<String>,
    pub stats: RepositoryStats,
}

/// Version and last-update time scraped from the release page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub latest_version: Option<String>,
    /// Already normalized to the catalog time zone.
    pub last_update_time: Option<String>,
}

impl ReleaseInfo {
    /// Returns true if the page yielded nothing usable.
    pub fn is_empty(&self) -> bool {
        self.latest_version.is_none() && self.last_update_time.is_none()
    }
}

/// The persisted, merged unit of `plugins.json`.
///
/// Deserialization is lenient so catalogs written by older tooling (string
/// authors, missing locales, null counters) still load as prior data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "normalize::null_as_default")]
    pub version: String,
    #[serde(default, deserialize_with = "normalize::description_lenient")]
    pub description: Description,
    #[serde(default, deserialize_with = "normalize::null_as_default")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "normalize::null_as_default")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "normalize::authors_lenient")]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub repository_url: Option<String>,
    #[serde(default, deserialize_with = "normalize::null_as_default")]
    pub downloads: u64,
    #[serde(default)]
    pub license: Option<String>,
    #[serde(default)]
    pub license_url: Option<String>,
    #[serde(default)]
    pub readme_url: Option<String>,
    #[serde(default)]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub last_update_time: Option<String>,
    #[serde(default, deserialize_with = "normalize::null_as_default")]
    pub update_time: String,
}
