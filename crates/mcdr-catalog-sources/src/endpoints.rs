// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! URL construction for every remote source.

use mcdr_catalog_config::{CatalogConfig, Mirror};

/// Name of the self-declared metadata file inside plugin repositories.
pub const METADATA_FILE: &str = "mcdreforged.plugin.json";

/// Name of the descriptor file inside each catalogue index folder.
pub const DESCRIPTOR_FILE: &str = "plugin_info.json";

/// Base URLs and retry policy shared by the adapters.
#[derive(Debug, Clone)]
pub struct SourceEndpoints {
    pub api_base: String,
    pub catalogue_repo: String,
    pub catalogue_branch: String,
    pub catalogue_path: String,
    pub cdn_base: String,
    pub raw_base: String,
    pub mirrors: Vec<Mirror>,
    pub release_base: String,
    pub release_query: String,
    pub fetch_stats: bool,
    pub max_retries: u32,
}

impl SourceEndpoints {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            api_base: trim_base(&config.github.api_base),
            catalogue_repo: config.github.catalogue_repo.trim_matches('/').to_string(),
            catalogue_branch: config.github.catalogue_branch.clone(),
            catalogue_path: config.github.catalogue_path.trim_matches('/').to_string(),
            cdn_base: trim_base(&config.sources.cdn_base),
            raw_base: trim_base(&config.sources.raw_base),
            mirrors: config.sources.mirrors.clone(),
            release_base: trim_base(&config.sources.release_base),
            release_query: config.sources.release_query.trim_start_matches('?').to_string(),
            fetch_stats: config.sources.fetch_stats,
            max_retries: config.fetch.max_retries,
        }
    }

    /// Repository-content API listing of the catalogue folder.
    pub fn listing_url(&self) -> String {
        format!(
            "{}/repos/{}/contents/{}?ref={}",
            self.api_base, self.catalogue_repo, self.catalogue_path, self.catalogue_branch
        )
    }

    /// CDN URL of one plugin's descriptor in the catalogue repository.
    pub fn descriptor_url(&self, slug: &str) -> String {
        format!(
            "{}/{}@{}/{}/{}/{DESCRIPTOR_FILE}",
            self.cdn_base, self.catalogue_repo, self.catalogue_branch, self.catalogue_path, slug
        )
    }

    /// URL of a file inside a plugin repository through the given mirror.
    ///
    /// `dir` is a normalized repository-relative directory; `None` is the root.
    pub fn content_url(&self, mirror: Mirror, repo: &RepoRef, dir: Option<&str>, file: &str) -> String {
        let path = match dir {
            Some(dir) => format!("{dir}/{file}"),
            None => file.to_string(),
        };
        match mirror {
            Mirror::Jsdelivr => format!(
                "{}/{}/{}@{}/{path}",
                self.cdn_base, repo.owner, repo.name, repo.branch
            ),
            Mirror::Raw => format!(
                "{}/{}/{}/{}/{path}",
                self.raw_base, repo.owner, repo.name, repo.branch
            ),
        }
    }

    /// Repository-content API URL under `/repos/<owner>/<repo>/`.
    pub fn repo_api_url(&self, repo: &RepoRef, tail: &str) -> String {
        format!("{}/repos/{}/{}/{tail}", self.api_base, repo.owner, repo.name)
    }

    /// Rendered plugin page carrying release information.
    pub fn release_url(&self, plugin_id: &str) -> String {
        if self.release_query.is_empty() {
            format!("{}/{plugin_id}", self.release_base)
        } else {
            format!("{}/{plugin_id}?{}", self.release_base, self.release_query)
        }
    }
}

fn trim_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

/// A GitHub repository at a branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    pub branch: String,
}

impl RepoRef {
    /// Parses `https://github.com/<owner>/<repo>[.git][/...]`.
    ///
    /// Only the owner and repository segments are used; anything after them
    /// (such as `/tree/<branch>`) is ignored.
    pub fn parse(repository: &str, branch: &str) -> Option<Self> {
        let rest = repository
            .trim()
            .strip_prefix("https://github.com/")
            .or_else(|| repository.trim().strip_prefix("http://github.com/"))?;
        let mut segments = rest.split('/').filter(|s| !s.is_empty());
        let owner = segments.next()?.to_string();
        let name = segments.next()?.trim_end_matches(".git").to_string();
        if name.is_empty() {
            return None;
        }
        let branch = branch.trim();
        Some(Self {
            owner,
            name,
            branch: if branch.is_empty() { "master" } else { branch }.to_string(),
        })
    }
}
