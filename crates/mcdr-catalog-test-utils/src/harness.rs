// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fake upstream services for end-to-end pipeline tests.
//!
//! `FakeCatalogue` starts one wiremock server that answers for the
//! repository-content API, the CDN mirror, and the release pages, and wires
//! a complete pipeline (fetcher, adapters, store in a temp directory) to it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use mcdr_catalog_config::{CatalogConfig, Mirror};
use mcdr_catalog_core::{CatalogRecord, CatalogStore, PluginIndex};
use mcdr_catalog_fetch::{ClientConfig, Fetcher};
use mcdr_catalog_pipeline::{JsonFileStore, Orchestrator};
use mcdr_catalog_sources::{RemoteIndex, SourceEndpoints, Sources};
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Timestamp returned by the harness clock for every merged record.
pub const FIXED_NOW: &str = "2026-01-01 08:00:00";

/// Builder for configuring the fake catalogue.
pub struct FakeCatalogueBuilder {
    request_timeout: Duration,
    max_retries: u32,
    concurrency: usize,
    fetch_stats: bool,
}

impl FakeCatalogueBuilder {
    fn new() -> Self {
        Self {
            request_timeout: Duration::from_millis(300),
            max_retries: 1,
            concurrency: 4,
            fetch_stats: false,
        }
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the retry bound for every source.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the number of request slots.
    pub fn with_concurrency(mut self, slots: usize) -> Self {
        self.concurrency = slots;
        self
    }

    /// Enable the license, readme, and release-asset statistics requests.
    pub fn with_stats(mut self) -> Self {
        self.fetch_stats = true;
        self
    }

    /// Start the server and build the pipeline pieces pointing at it.
    pub async fn build(self) -> FakeCatalogue {
        let server = MockServer::start().await;
        let temp_dir = tempfile::TempDir::new().unwrap_or_else(|e| panic!("temp dir: {e}"));

        let mut config = CatalogConfig::default();
        config.github.api_base = server.uri();
        config.sources.cdn_base = format!("{}/gh", server.uri());
        config.sources.raw_base = format!("{}/raw", server.uri());
        config.sources.release_base = format!("{}/zh-CN/plugin", server.uri());
        config.sources.mirrors = vec![Mirror::Jsdelivr];
        config.sources.fetch_stats = self.fetch_stats;
        config.fetch.max_retries = self.max_retries;
        config.fetch.concurrency = self.concurrency;
        config.output.dir = temp_dir.path().to_path_buf();

        let fetcher = Fetcher::new(ClientConfig {
            timeout: self.request_timeout,
            backoff_base: Duration::from_millis(1),
            ..ClientConfig::from_config(&config, None)
        })
        .unwrap_or_else(|e| panic!("fetcher: {e}"));

        // Anything not mounted explicitly is absent.
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .with_priority(u8::MAX)
            .mount(&server)
            .await;

        FakeCatalogue {
            server,
            endpoints: Arc::new(SourceEndpoints::from_config(&config)),
            config,
            fetcher,
            _temp_dir: temp_dir,
        }
    }
}

/// A fake upstream plus a pipeline wired to it.
pub struct FakeCatalogue {
    /// The wiremock server answering every source.
    pub server: MockServer,
    /// Configuration pointing at `server`, output in a temp directory.
    pub config: CatalogConfig,
    /// The shared fetcher, exposed for slot and retry assertions.
    pub fetcher: Fetcher,
    endpoints: Arc<SourceEndpoints>,
    /// Temp directory kept alive for cleanup on drop.
    _temp_dir: tempfile::TempDir,
}

impl FakeCatalogue {
    /// Start a fake catalogue with default settings.
    pub async fn start() -> Self {
        Self::builder().build().await
    }

    /// Create a new builder for configuring the fake catalogue.
    pub fn builder() -> FakeCatalogueBuilder {
        FakeCatalogueBuilder::new()
    }

    /// Path of the catalog file the pipeline reads and writes.
    pub fn catalog_path(&self) -> PathBuf {
        self.config.output.catalog_path()
    }

    /// Store over [`catalog_path`](Self::catalog_path).
    pub fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.catalog_path())
    }

    /// Write a prior catalog.
    pub async fn seed_prior(&self, records: &[CatalogRecord]) {
        self.store()
            .commit(records)
            .await
            .unwrap_or_else(|e| panic!("seed prior catalog: {e}"));
    }

    /// Read the committed catalog back.
    pub async fn read_catalog(&self) -> Vec<CatalogRecord> {
        self.store()
            .load()
            .await
            .unwrap_or_else(|e| panic!("read catalog: {e}"))
    }

    /// Remote index reading the listing and descriptors from the server.
    pub fn remote_index(&self) -> RemoteIndex {
        RemoteIndex::new(self.fetcher.clone(), Arc::clone(&self.endpoints))
    }

    /// Source adapters reading from the server.
    pub fn sources(&self) -> Sources {
        Sources::new(self.fetcher.clone(), Arc::clone(&self.endpoints))
    }

    /// Orchestrator over the remote index with a fixed clock.
    pub fn orchestrator(&self) -> Orchestrator {
        self.orchestrator_with_index(Arc::new(self.remote_index()))
    }

    /// Orchestrator over any index with a fixed clock.
    pub fn orchestrator_with_index(&self, index: Arc<dyn PluginIndex>) -> Orchestrator {
        Orchestrator::new(index, Arc::new(self.sources()), Arc::new(self.store()))
            .with_clock(|| FIXED_NOW.to_string())
    }

    /// Serve the catalogue folder listing with one directory per slug.
    pub async fn mount_listing(&self, slugs: &[&str]) {
        let mut entries: Vec<serde_json::Value> = slugs
            .iter()
            .map(|slug| serde_json::json!({"name": slug, "type": "dir"}))
            .collect();
        entries.push(serde_json::json!({"name": "README.md", "type": "file"}));
        Mock::given(method("GET"))
            .and(path("/repos/MCDReforged/PluginCatalogue/contents/plugins"))
            .and(query_param("ref", "master"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entries))
            .mount(&self.server)
            .await;
    }

    /// Make the catalogue listing fail with the given status.
    pub async fn fail_listing(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/repos/MCDReforged/PluginCatalogue/contents/plugins"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Serve `plugin_info.json` for one slug.
    pub async fn mount_descriptor(&self, slug: &str, descriptor: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!(
                "/gh/MCDReforged/PluginCatalogue@master/plugins/{slug}/plugin_info.json"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(descriptor))
            .mount(&self.server)
            .await;
    }

    /// Serve `mcdreforged.plugin.json` for a repository directory (`None` is the root).
    pub async fn mount_metadata(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        dir: Option<&str>,
        metadata: serde_json::Value,
    ) {
        let file = match dir {
            Some(dir) => format!("{dir}/mcdreforged.plugin.json"),
            None => "mcdreforged.plugin.json".to_string(),
        };
        Mock::given(method("GET"))
            .and(path(format!("/gh/{owner}/{repo}@{branch}/{file}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(metadata))
            .mount(&self.server)
            .await;
    }

    /// Make every mirror request for a repository stall past the request timeout.
    pub async fn stall_repository(&self, owner: &str, repo: &str) {
        Mock::given(method("GET"))
            .and(path_regex(format!("^/gh/{owner}/{repo}@")))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&self.server)
            .await;
    }

    /// Serve the release assets of a repository.
    pub async fn mount_releases(&self, owner: &str, repo: &str, releases: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/{owner}/{repo}/releases")))
            .respond_with(ResponseTemplate::new(200).set_body_json(releases))
            .mount(&self.server)
            .await;
    }

    /// Serve the rendered release page of a plugin.
    pub async fn mount_release_page(&self, plugin_id: &str, page: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/zh-CN/plugin/{plugin_id}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(page))
            .mount(&self.server)
            .await;
    }
}

/// Renders a minimal release page carrying one release link and one date token.
pub fn release_page(plugin_id: &str, tag: &str, published: &str) -> String {
    format!(
        r#"1:["$","a",null,{{"href":"/plugin/{plugin_id}/release/{tag}"}}]
2:{{"published":"{published}"}}"#
    )
}
