// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Index adapters: the remote catalogue repository and a local checkout of it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use mcdr_catalog_core::{CatalogError, PluginDescriptor, PluginIndex};
use mcdr_catalog_fetch::Fetcher;
use serde::Deserialize;
use tracing::{debug, info};

use crate::endpoints::{DESCRIPTOR_FILE, SourceEndpoints};

/// One entry of the repository-content API directory listing.
#[derive(Debug, Deserialize)]
struct ListingEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Reads the catalogue index from the remote repository.
///
/// The folder listing goes through the repository-content API; descriptors
/// are read through the CDN mirror.
pub struct RemoteIndex {
    fetcher: Fetcher,
    endpoints: Arc<SourceEndpoints>,
}

impl RemoteIndex {
    pub fn new(fetcher: Fetcher, endpoints: Arc<SourceEndpoints>) -> Self {
        Self { fetcher, endpoints }
    }
}

#[async_trait]
impl PluginIndex for RemoteIndex {
    fn name(&self) -> &str {
        "remote"
    }

    async fn list(&self) -> Result<Vec<String>, CatalogError> {
        let url = self.endpoints.listing_url();
        let body = self
            .fetcher
            .fetch(&url, self.endpoints.max_retries)
            .await
            .map_err(|e| CatalogError::FatalConfig(format!("catalogue listing unavailable: {e}")))?;
        let entries: Vec<ListingEntry> = serde_json::from_str(&body)
            .map_err(|e| CatalogError::FatalConfig(format!("malformed catalogue listing: {e}")))?;

        let slugs: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.kind == "dir")
            .map(|entry| entry.name)
            .collect();
        info!(count = slugs.len(), "remote catalogue listed");
        Ok(slugs)
    }

    async fn descriptor(&self, slug: &str) -> Result<PluginDescriptor, CatalogError> {
        let url = self.endpoints.descriptor_url(slug);
        let body = self.fetcher.fetch(&url, self.endpoints.max_retries).await?;
        parse_descriptor(slug, &body)
    }
}

/// Reads the catalogue index from a local directory laid out like the
/// remote one: `<root>/<slug>/plugin_info.json`.
pub struct LocalIndex {
    root: PathBuf,
}

impl LocalIndex {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl PluginIndex for LocalIndex {
    fn name(&self) -> &str {
        "local"
    }

    async fn list(&self) -> Result<Vec<String>, CatalogError> {
        let mut dir = tokio::fs::read_dir(&self.root).await.map_err(|e| {
            CatalogError::FatalConfig(format!(
                "cannot read plugin directory {}: {e}",
                self.root.display()
            ))
        })?;

        let mut slugs = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| {
            CatalogError::FatalConfig(format!("cannot list {}: {e}", self.root.display()))
        })? {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if is_dir && let Some(name) = entry.file_name().to_str() {
                slugs.push(name.to_string());
            }
        }
        slugs.sort();
        info!(count = slugs.len(), root = %self.root.display(), "local catalogue listed");
        Ok(slugs)
    }

    async fn descriptor(&self, slug: &str) -> Result<PluginDescriptor, CatalogError> {
        let path = self.root.join(slug).join(DESCRIPTOR_FILE);
        debug!(plugin = slug, path = %path.display(), "reading local descriptor");
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| CatalogError::parse(path.display().to_string(), e))?;
        parse_descriptor(slug, &body)
    }
}

fn parse_descriptor(slug: &str, body: &str) -> Result<PluginDescriptor, CatalogError> {
    serde_json::from_str(body).map_err(|e| CatalogError::parse(format!("descriptor of {slug}"), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcdr_catalog_config::CatalogConfig;
    use mcdr_catalog_fetch::ClientConfig;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn remote(server: &MockServer) -> RemoteIndex {
        let mut config = CatalogConfig::default();
        config.github.api_base = server.uri();
        config.sources.cdn_base = format!("{}/gh", server.uri());
        config.fetch.max_retries = 1;
        let fetcher = Fetcher::new(ClientConfig {
            backoff_base: Duration::from_millis(1),
            ..ClientConfig::from_config(&config, None)
        })
        .unwrap();
        RemoteIndex::new(fetcher, Arc::new(SourceEndpoints::from_config(&config)))
    }

    #[tokio::test]
    async fn remote_list_keeps_directories_only() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/MCDReforged/PluginCatalogue/contents/plugins"))
            .and(query_param("ref", "master"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "alpha", "type": "dir"},
                {"name": "README.md", "type": "file"},
                {"name": "beta", "type": "dir"}
            ])))
            .mount(&server)
            .await;

        let slugs = remote(&server).list().await.unwrap();
        assert_eq!(slugs, vec!["alpha", "beta"]);
    }

    #[tokio::test]
    async fn remote_list_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let err = remote(&server).list().await.unwrap_err();
        assert!(matches!(err, CatalogError::FatalConfig(_)), "got: {err}");
    }

    #[tokio::test]
    async fn remote_descriptor_parses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gh/MCDReforged/PluginCatalogue@master/plugins/alpha/plugin_info.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "alpha",
                "repository": "https://github.com/alice/Alpha",
                "branch": "main",
                "disable": true
            })))
            .mount(&server)
            .await;

        let d = remote(&server).descriptor("alpha").await.unwrap();
        assert_eq!(d.id.as_deref(), Some("alpha"));
        assert!(d.is_disabled());
    }

    #[tokio::test]
    async fn remote_descriptor_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json"))
            .mount(&server)
            .await;

        let err = remote(&server).descriptor("alpha").await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }), "got: {err}");
    }

    #[tokio::test]
    async fn local_index_lists_sorted_directories() {
        let dir = tempfile::tempdir().unwrap();
        for slug in ["zeta", "alpha"] {
            std::fs::create_dir(dir.path().join(slug)).unwrap();
        }
        std::fs::write(dir.path().join("README.md"), "# index").unwrap();
        std::fs::write(
            dir.path().join("alpha").join(DESCRIPTOR_FILE),
            r#"{"id": "alpha", "repository": "https://github.com/a/b", "branch": "main"}"#,
        )
        .unwrap();

        let index = LocalIndex::new(dir.path());
        assert_eq!(index.list().await.unwrap(), vec!["alpha", "zeta"]);

        let d = index.descriptor("alpha").await.unwrap();
        assert_eq!(d.branch.as_deref(), Some("main"));

        let missing = index.descriptor("zeta").await.unwrap_err();
        assert!(matches!(missing, CatalogError::Parse { .. }));
    }

    #[tokio::test]
    async fn local_index_missing_root_is_fatal() {
        let index = LocalIndex::new("/nonexistent/mcdr-catalog-test");
        assert!(matches!(
            index.list().await.unwrap_err(),
            CatalogError::FatalConfig(_)
        ));
    }
}
