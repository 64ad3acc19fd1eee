// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Repository adapter: the plugin's own `mcdreforged.plugin.json` plus
//! license, readme, and download statistics from the repository-content API.

use std::collections::BTreeMap;
use std::sync::Arc;

use mcdr_catalog_core::normalize::{self, AuthorField, DescriptionField};
use mcdr_catalog_core::types::normalize_related_path;
use mcdr_catalog_core::{CatalogError, PluginDescriptor, RepositoryStats, SourceFragment};
use mcdr_catalog_fetch::Fetcher;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::endpoints::{METADATA_FILE, RepoRef, SourceEndpoints};

/// Conventional metadata locations tried after the declared relative path.
/// `None` is the repository root.
pub const FALLBACK_DIRS: &[Option<&str>] = &[None, Some("src"), Some("plugin"), Some("plugins")];

/// Wire shape of `mcdreforged.plugin.json`. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    description: Option<DescriptionField>,
    #[serde(default, alias = "authors")]
    author: Option<AuthorField>,
    #[serde(default, deserialize_with = "normalize::dependencies_opt")]
    dependencies: Option<BTreeMap<String, String>>,
    #[serde(default)]
    link: Option<String>,
}

/// Parses a metadata file body into a fragment.
///
/// The body must be a JSON object; author and description fields of any
/// shape are normalized.
pub fn parse_metadata(body: &str) -> Result<SourceFragment, CatalogError> {
    let file: MetadataFile =
        serde_json::from_str(body).map_err(|e| CatalogError::parse(METADATA_FILE, e))?;
    Ok(SourceFragment {
        id: file.id.filter(|s| !s.trim().is_empty()),
        name: file.name.filter(|s| !s.trim().is_empty()),
        version: file.version.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        description: file
            .description
            .map(DescriptionField::into_localized)
            .unwrap_or_default(),
        dependencies: file.dependencies,
        authors: file
            .author
            .map(AuthorField::into_authors)
            .filter(|a| !a.is_empty()),
        repository: file.link,
        ..SourceFragment::default()
    })
}

/// Candidate metadata directories: the declared path first, then the fallbacks.
pub fn candidate_dirs(related_path: Option<&str>) -> Vec<Option<String>> {
    let mut dirs: Vec<Option<String>> = Vec::new();
    if let Some(path) = related_path.and_then(normalize_related_path) {
        dirs.push(Some(path));
    }
    for dir in FALLBACK_DIRS {
        let dir = dir.map(str::to_string);
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    }
    dirs
}

#[derive(Debug, Deserialize)]
struct LicenseResponse {
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    license: Option<LicenseInfo>,
}

#[derive(Debug, Deserialize)]
struct LicenseInfo {
    #[serde(default)]
    spdx_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReadmeResponse {
    #[serde(default)]
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    tag_name: String,
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    #[serde(default)]
    name: String,
    #[serde(default)]
    download_count: u64,
}

/// Reads a plugin repository's self-declared metadata and statistics.
pub struct RepositoryAdapter {
    fetcher: Fetcher,
    endpoints: Arc<SourceEndpoints>,
}

impl RepositoryAdapter {
    pub fn new(fetcher: Fetcher, endpoints: Arc<SourceEndpoints>) -> Self {
        Self { fetcher, endpoints }
    }

    /// Reads the repository fragment for a descriptor, statistics included.
    ///
    /// Returns `None` when the descriptor names no GitHub repository or no
    /// candidate location yields valid metadata. Never fails.
    pub async fn fragment(&self, plugin_id: &str, descriptor: &PluginDescriptor) -> Option<SourceFragment> {
        let repository = descriptor.repository.as_deref()?;
        let Some(repo) = RepoRef::parse(repository, descriptor.branch.as_deref().unwrap_or("")) else {
            warn!(plugin = plugin_id, repository, "repository is not a GitHub repository");
            return None;
        };
        let related = descriptor.related_path.as_deref().and_then(normalize_related_path);

        let (metadata, stats) = tokio::join!(
            self.metadata(plugin_id, &repo, descriptor.related_path.as_deref()),
            self.stats(plugin_id, &repo, related.as_deref()),
        );

        match metadata {
            Some(mut fragment) => {
                fragment.branch = Some(repo.branch.clone());
                fragment.stats = stats;
                Some(fragment)
            }
            None if stats != RepositoryStats::default() => Some(SourceFragment {
                stats,
                ..SourceFragment::default()
            }),
            None => None,
        }
    }

    /// Tries each candidate directory, and each mirror within it, until a
    /// metadata file parses.
    ///
    /// A 404 (the file is not there) moves on to the next directory. Any other
    /// failure, including refusals such as 403, moves on to the next mirror.
    pub async fn metadata(
        &self,
        plugin_id: &str,
        repo: &RepoRef,
        related_path: Option<&str>,
    ) -> Option<SourceFragment> {
        for dir in candidate_dirs(related_path) {
            for &mirror in &self.endpoints.mirrors {
                let url = self
                    .endpoints
                    .content_url(mirror, repo, dir.as_deref(), METADATA_FILE);
                match self.fetcher.fetch(&url, self.endpoints.max_retries).await {
                    Ok(body) => match parse_metadata(&body) {
                        Ok(mut fragment) => {
                            debug!(plugin = plugin_id, url, "metadata file found");
                            fragment.related_path = dir.clone();
                            return Some(fragment);
                        }
                        Err(e) => {
                            warn!(plugin = plugin_id, url, error = %e, "metadata file is not valid JSON");
                            break;
                        }
                    },
                    Err(CatalogError::Status { status: 404, .. }) => {
                        debug!(plugin = plugin_id, url, "no metadata file here");
                        break;
                    }
                    Err(e) => {
                        warn!(plugin = plugin_id, url, %mirror, error = %e, "mirror unavailable");
                    }
                }
            }
        }
        warn!(plugin = plugin_id, repo = %format!("{}/{}", repo.owner, repo.name), "no metadata file found");
        None
    }

    /// Reads license, readme, and download statistics. Each is independently
    /// optional; failures leave the corresponding field `None`.
    pub async fn stats(&self, plugin_id: &str, repo: &RepoRef, related_dir: Option<&str>) -> RepositoryStats {
        if !self.endpoints.fetch_stats {
            return RepositoryStats::default();
        }

        let (license, readme_url, downloads) = tokio::join!(
            self.license(plugin_id, repo),
            self.readme(plugin_id, repo, related_dir),
            self.downloads(plugin_id, repo, related_dir.is_some()),
        );
        let (license, license_url) = license.unwrap_or_default();
        RepositoryStats {
            downloads,
            license,
            license_url,
            readme_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, plugin_id: &str, url: &str) -> Option<T> {
        let body = match self.fetcher.fetch(url, self.endpoints.max_retries).await {
            Ok(body) => body,
            Err(e) => {
                debug!(plugin = plugin_id, url, error = %e, "statistics unavailable");
                return None;
            }
        };
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(plugin = plugin_id, url, error = %e, "malformed statistics response");
                None
            }
        }
    }

    async fn license(&self, plugin_id: &str, repo: &RepoRef) -> Option<(Option<String>, Option<String>)> {
        let url = self.endpoints.repo_api_url(repo, "license");
        let response: LicenseResponse = self.get_json(plugin_id, &url).await?;
        let license = response.license.and_then(|info| {
            info.spdx_id
                .filter(|id| !id.is_empty() && id != "NOASSERTION")
                .or(info.name)
        });
        Some((license, response.html_url))
    }

    async fn readme(&self, plugin_id: &str, repo: &RepoRef, related_dir: Option<&str>) -> Option<String> {
        if let Some(dir) = related_dir {
            let url = self
                .endpoints
                .repo_api_url(repo, &format!("readme/{dir}?ref={}", repo.branch));
            if let Some(ReadmeResponse { html_url: Some(url) }) = self.get_json(plugin_id, &url).await {
                return Some(url);
            }
        }
        let url = self
            .endpoints
            .repo_api_url(repo, &format!("readme?ref={}", repo.branch));
        let response: ReadmeResponse = self.get_json(plugin_id, &url).await?;
        response.html_url
    }

    /// Sums asset download counts. In repositories hosting several plugins
    /// only releases or assets mentioning the plugin id count.
    async fn downloads(&self, plugin_id: &str, repo: &RepoRef, shared_repo: bool) -> Option<u64> {
        let url = self.endpoints.repo_api_url(repo, "releases?per_page=100");
        let releases: Vec<Release> = self.get_json(plugin_id, &url).await?;
        let total = releases
            .iter()
            .flat_map(|release| {
                release
                    .assets
                    .iter()
                    .filter(move |asset| {
                        !shared_repo
                            || release.tag_name.contains(plugin_id)
                            || asset.name.contains(plugin_id)
                    })
            })
            .map(|asset| asset.download_count)
            .sum();
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcdr_catalog_config::{CatalogConfig, Mirror};
    use mcdr_catalog_fetch::ClientConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn adapter(server: &MockServer, mirrors: Vec<Mirror>, fetch_stats: bool) -> RepositoryAdapter {
        let mut config = CatalogConfig::default();
        config.github.api_base = server.uri();
        config.sources.cdn_base = format!("{}/gh", server.uri());
        config.sources.raw_base = format!("{}/raw", server.uri());
        config.sources.mirrors = mirrors;
        config.sources.fetch_stats = fetch_stats;
        config.fetch.max_retries = 0;
        let fetcher = Fetcher::new(ClientConfig {
            backoff_base: Duration::from_millis(1),
            ..ClientConfig::from_config(&config, None)
        })
        .unwrap();
        RepositoryAdapter::new(fetcher, Arc::new(SourceEndpoints::from_config(&config)))
    }

    fn descriptor(related_path: Option<&str>) -> PluginDescriptor {
        PluginDescriptor {
            id: Some("foo".into()),
            repository: Some("https://github.com/alice/Foo".into()),
            branch: Some("main".into()),
            related_path: related_path.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn candidate_dirs_put_related_path_first() {
        assert_eq!(
            candidate_dirs(Some("./plugins/foo/")),
            vec![
                Some("plugins/foo".to_string()),
                None,
                Some("src".to_string()),
                Some("plugin".to_string()),
                Some("plugins".to_string()),
            ]
        );
        assert_eq!(candidate_dirs(Some("src")).len(), 4);
        assert_eq!(candidate_dirs(None).len(), 4);
    }

    #[test]
    fn parse_metadata_normalizes_shapes() {
        let fragment = parse_metadata(
            r#"{
                "id": "foo",
                "version": " 1.2.0 ",
                "name": "Foo",
                "description": "Does foo",
                "author": "alice",
                "dependencies": {"mcdreforged": ">=2.0.0"},
                "link": "https://github.com/alice/Foo"
            }"#,
        )
        .unwrap();
        assert_eq!(fragment.version.as_deref(), Some("1.2.0"));
        assert_eq!(fragment.description.zh_cn.as_deref(), Some("Does foo"));
        let authors = fragment.authors.unwrap();
        assert_eq!(authors[0].link.as_deref(), Some("https://github.com/alice"));
        assert_eq!(fragment.dependencies.unwrap()["mcdreforged"], ">=2.0.0");
    }

    #[test]
    fn parse_metadata_rejects_non_object() {
        assert!(matches!(
            parse_metadata("[1, 2, 3]"),
            Err(CatalogError::Parse { .. })
        ));
        assert!(parse_metadata("{ broken").is_err());
    }

    #[tokio::test]
    async fn metadata_falls_back_through_conventional_dirs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gh/alice/Foo@main/src/mcdreforged.plugin.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "foo", "version": "1.0.0"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let adapter = adapter(&server, vec![Mirror::Jsdelivr], false);
        let fragment = adapter.fragment("foo", &descriptor(None)).await.unwrap();
        assert_eq!(fragment.version.as_deref(), Some("1.0.0"));
        assert_eq!(fragment.related_path.as_deref(), Some("src"));
        assert_eq!(fragment.branch.as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn metadata_prefers_related_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gh/alice/Foo@main/nested/foo/mcdreforged.plugin.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "3.0.0"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gh/alice/Foo@main/mcdreforged.plugin.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "0.0.1"
            })))
            .expect(0)
            .mount(&server)
            .await;

        let adapter = adapter(&server, vec![Mirror::Jsdelivr], false);
        let fragment = adapter
            .fragment("foo", &descriptor(Some("nested/foo")))
            .await
            .unwrap();
        assert_eq!(fragment.version.as_deref(), Some("3.0.0"));
    }

    #[tokio::test]
    async fn transient_mirror_failure_tries_next_mirror() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gh/alice/Foo@main/mcdreforged.plugin.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/alice/Foo/main/mcdreforged.plugin.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "2.0.0"
            })))
            .mount(&server)
            .await;

        let adapter = adapter(&server, vec![Mirror::Jsdelivr, Mirror::Raw], false);
        let fragment = adapter.fragment("foo", &descriptor(None)).await.unwrap();
        assert_eq!(fragment.version.as_deref(), Some("2.0.0"));
    }

    #[tokio::test]
    async fn refused_mirror_falls_back_to_raw() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/gh/"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Package size exceeded"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/alice/Foo/main/mcdreforged.plugin.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "2.0.0"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = adapter(&server, vec![Mirror::Jsdelivr, Mirror::Raw], false);
        let fragment = adapter.fragment("foo", &descriptor(None)).await.unwrap();
        assert_eq!(fragment.version.as_deref(), Some("2.0.0"));
    }

    #[tokio::test]
    async fn missing_file_on_first_mirror_skips_the_rest() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path_regex("^/gh/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex("^/raw/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "version": "9.9.9"
            })))
            .expect(0)
            .mount(&server)
            .await;

        let adapter = adapter(&server, vec![Mirror::Jsdelivr, Mirror::Raw], false);
        assert!(adapter.fragment("foo", &descriptor(None)).await.is_none());
    }

    #[tokio::test]
    async fn total_failure_yields_no_fragment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let adapter = adapter(&server, vec![Mirror::Jsdelivr, Mirror::Raw], true);
        assert!(adapter.fragment("foo", &descriptor(None)).await.is_none());
    }

    #[tokio::test]
    async fn non_github_repository_yields_no_fragment() {
        let server = MockServer::start().await;
        let adapter = adapter(&server, vec![Mirror::Jsdelivr], false);
        let d = PluginDescriptor {
            repository: Some("https://gitlab.com/alice/Foo".into()),
            ..descriptor(None)
        };
        assert!(adapter.fragment("foo", &d).await.is_none());
    }

    #[tokio::test]
    async fn stats_are_read_from_the_api() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gh/alice/Foo@main/mcdreforged.plugin.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"version": "1.0.0"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/Foo/license"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "html_url": "https://github.com/alice/Foo/blob/main/LICENSE",
                "license": {"spdx_id": "GPL-3.0", "name": "GNU General Public License v3.0"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/Foo/readme"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "html_url": "https://github.com/alice/Foo/blob/main/README.md"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/Foo/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"tag_name": "v1.0.0", "assets": [{"name": "Foo-v1.0.0.mcdr", "download_count": 40}]},
                {"tag_name": "v0.9.0", "assets": [{"name": "Foo-v0.9.0.mcdr", "download_count": 2}]}
            ])))
            .mount(&server)
            .await;

        let adapter = adapter(&server, vec![Mirror::Jsdelivr], true);
        let fragment = adapter.fragment("foo", &descriptor(None)).await.unwrap();
        assert_eq!(
            fragment.stats,
            RepositoryStats {
                downloads: Some(42),
                license: Some("GPL-3.0".into()),
                license_url: Some("https://github.com/alice/Foo/blob/main/LICENSE".into()),
                readme_url: Some("https://github.com/alice/Foo/blob/main/README.md".into()),
            }
        );
    }

    #[tokio::test]
    async fn shared_repo_counts_only_matching_assets() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/alice/Foo/releases"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"tag_name": "foo-v1.0.0", "assets": [{"name": "Foo.mcdr", "download_count": 10}]},
                {"tag_name": "bar-v1.0.0", "assets": [{"name": "Bar.mcdr", "download_count": 99}]}
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let adapter = adapter(&server, vec![Mirror::Jsdelivr], true);
        let repo = RepoRef::parse("https://github.com/alice/Foo", "main").unwrap();
        let stats = adapter.stats("foo", &repo, Some("foo")).await;
        assert_eq!(stats.downloads, Some(10));
        assert_eq!(stats.license, None);
    }
}
