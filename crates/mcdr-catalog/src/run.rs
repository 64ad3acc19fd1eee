// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wires configuration, credential, adapters, and store into one catalog run.

use std::path::Path;
use std::sync::Arc;

use mcdr_catalog_config::CatalogConfig;
use mcdr_catalog_core::{CatalogError, PluginIndex};
use mcdr_catalog_fetch::{ClientConfig, Fetcher};
use mcdr_catalog_pipeline::{JsonFileStore, Orchestrator, RunSummary};
use mcdr_catalog_sources::{LocalIndex, RemoteIndex, SourceEndpoints, Sources};
use secrecy::SecretString;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Environment variable consulted when the config carries no token.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

pub const EXIT_OK: i32 = 0;
pub const EXIT_CONFIG: i32 = 1;
pub const EXIT_CREDENTIAL: i32 = 2;
pub const EXIT_LISTING: i32 = 3;
pub const EXIT_STORE: i32 = 4;
pub const EXIT_CANCELLED: i32 = 130;

/// Failures that end the process.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no GitHub credential: set github.token or {TOKEN_ENV}")]
    MissingCredential,

    #[error("unusable GitHub credential: {0}")]
    InvalidCredential(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl RunError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::MissingCredential | RunError::InvalidCredential(_) => EXIT_CREDENTIAL,
            RunError::Catalog(CatalogError::FatalConfig(_)) => EXIT_LISTING,
            RunError::Catalog(CatalogError::Store { .. }) => EXIT_STORE,
            RunError::Catalog(CatalogError::Cancelled) => EXIT_CANCELLED,
            RunError::Catalog(_) => EXIT_CONFIG,
        }
    }
}

/// Picks the configured token, else the environment one. Blank values count as absent.
pub fn resolve_token(configured: Option<&str>, from_env: Option<String>) -> Option<SecretString> {
    configured
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .or_else(|| from_env.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()))
        .map(SecretString::from)
}

/// Runs the catalog pipeline once.
///
/// With `plugins_dir` set, the index is read from that directory instead of
/// the remote listing; every other source stays remote.
pub async fn run_catalog(
    config: &CatalogConfig,
    plugins_dir: Option<&Path>,
    token: SecretString,
    cancel: &CancellationToken,
) -> Result<RunSummary, RunError> {
    let fetcher = Fetcher::new(ClientConfig::from_config(config, Some(token))).map_err(|e| match e {
        CatalogError::FatalConfig(message) => RunError::InvalidCredential(message),
        other => RunError::Catalog(other),
    })?;
    let endpoints = Arc::new(SourceEndpoints::from_config(config));

    let index: Arc<dyn PluginIndex> = match plugins_dir {
        Some(dir) => Arc::new(LocalIndex::new(dir)),
        None => Arc::new(RemoteIndex::new(fetcher.clone(), Arc::clone(&endpoints))),
    };
    let sources = Arc::new(Sources::new(fetcher.clone(), endpoints));
    let catalog_path = config.output.catalog_path();
    let store = Arc::new(JsonFileStore::new(&catalog_path));

    info!(
        index = index.name(),
        catalog = %catalog_path.display(),
        concurrency = fetcher.capacity(),
        "starting catalog run"
    );
    let summary = Orchestrator::new(index, sources, store).run(cancel).await?;

    let stats = fetcher.stats();
    info!(
        attempts = stats.attempts,
        successes = stats.successes,
        failures = stats.failures,
        retries = stats.retries,
        peak_in_flight = stats.peak_in_flight,
        "fetch statistics"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcdr_catalog_test_utils::FakeCatalogue;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use tracing_test::traced_test;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn test_config(fake: &FakeCatalogue) -> CatalogConfig {
        let mut config = fake.config.clone();
        config.fetch.backoff_base_ms = 1;
        config.fetch.timeout_secs = 5;
        config
    }

    #[test]
    fn token_resolution_order() {
        let token = resolve_token(Some("from-config"), Some("from-env".into())).unwrap();
        assert_eq!(token.expose_secret(), "from-config");

        let token = resolve_token(Some("  "), Some("from-env".into())).unwrap();
        assert_eq!(token.expose_secret(), "from-env");

        assert!(resolve_token(None, Some(String::new())).is_none());
        assert!(resolve_token(None, None).is_none());
    }

    #[test]
    fn exit_codes_per_failure() {
        assert_eq!(RunError::MissingCredential.exit_code(), EXIT_CREDENTIAL);
        assert_eq!(
            RunError::from(CatalogError::FatalConfig("listing".into())).exit_code(),
            EXIT_LISTING
        );
        assert_eq!(
            RunError::from(CatalogError::Store {
                path: "plugins.json".into(),
                source: Box::new(std::io::Error::other("denied")),
            })
            .exit_code(),
            EXIT_STORE
        );
        assert_eq!(RunError::from(CatalogError::Cancelled).exit_code(), EXIT_CANCELLED);
    }

    #[tokio::test]
    #[traced_test]
    async fn remote_run_sends_token_and_writes_catalog() {
        let fake = FakeCatalogue::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/MCDReforged/PluginCatalogue/contents/plugins"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"name": "foo", "type": "dir"}])),
            )
            .expect(1)
            .mount(&fake.server)
            .await;
        fake.mount_descriptor("foo", json!({"id": "foo"})).await;

        let summary = run_catalog(
            &test_config(&fake),
            None,
            SecretString::from("secret-token"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(fake.read_catalog().await[0].id, "foo");
        assert!(logs_contain("fetch statistics"));
    }

    #[tokio::test]
    async fn unreachable_listing_maps_to_listing_exit_code() {
        let fake = FakeCatalogue::start().await;
        fake.fail_listing(502).await;

        let err = run_catalog(
            &test_config(&fake),
            None,
            SecretString::from("t"),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.exit_code(), EXIT_LISTING);
    }

    #[tokio::test]
    async fn local_plugins_dir_replaces_remote_listing() {
        let fake = FakeCatalogue::start().await;
        let plugins = tempfile::tempdir().unwrap();
        for (slug, descriptor) in [
            ("alpha", json!({"id": "alpha"})),
            ("beta", json!({"id": "beta", "disable": true})),
        ] {
            std::fs::create_dir(plugins.path().join(slug)).unwrap();
            std::fs::write(
                plugins.path().join(slug).join("plugin_info.json"),
                descriptor.to_string(),
            )
            .unwrap();
        }

        let summary = run_catalog(
            &test_config(&fake),
            Some(plugins.path()),
            SecretString::from("t"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(summary.listed, 2);
        assert_eq!(summary.skipped, 1);

        let catalog = fake.read_catalog().await;
        let ids: Vec<&str> = catalog.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha"]);
    }
}
