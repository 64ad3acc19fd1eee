// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the catalog configuration system.

use std::io::Write;

use mcdr_catalog_config::diagnostic::ConfigError;
use mcdr_catalog_config::{load_and_validate, load_and_validate_str, load_config_from_str, Mirror};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_catalog_config() {
    let toml = r#"
[fetch]
timeout_secs = 5
max_retries = 1
concurrency = 2
backoff_base_ms = 10
user_agent = "test-agent"

[github]
token = "ghp_abc"
api_base = "http://127.0.0.1:9000"
catalogue_repo = "alice/Catalogue"
catalogue_branch = "main"
catalogue_path = "entries"

[sources]
cdn_base = "http://127.0.0.1:9001/gh"
raw_base = "http://127.0.0.1:9002"
mirrors = ["raw"]
release_base = "http://127.0.0.1:9003/plugin"
release_query = ""
fetch_stats = false

[output]
dir = "/tmp/catalog"
file_name = "out.json"

[log]
level = "debug"
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.fetch.timeout_secs, 5);
    assert_eq!(config.fetch.max_retries, 1);
    assert_eq!(config.fetch.concurrency, 2);
    assert_eq!(config.github.token.as_deref(), Some("ghp_abc"));
    assert_eq!(config.github.catalogue_repo, "alice/Catalogue");
    assert_eq!(config.sources.mirrors, vec![Mirror::Raw]);
    assert!(!config.sources.fetch_stats);
    assert_eq!(
        config.output.catalog_path(),
        std::path::PathBuf::from("/tmp/catalog/out.json")
    );
    assert_eq!(config.log.level, "debug");
}

/// Empty TOML falls back to every default.
#[test]
fn empty_toml_uses_defaults() {
    let config = load_and_validate_str("").expect("defaults should validate");
    assert_eq!(config.fetch.concurrency, 10);
    assert_eq!(config.github.api_base, "https://api.github.com");
    assert_eq!(config.sources.release_query, "_rsc=1rz10");
}

/// Unknown field produces an UnknownKey diagnostic with a suggestion.
#[test]
fn unknown_field_in_fetch_suggests_correction() {
    let toml = r#"
[fetch]
max_retires = 2
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "max_retires");
            assert_eq!(suggestion.as_deref(), Some("max_retries"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

/// Unknown mirror names are rejected at deserialization time.
#[test]
fn unknown_mirror_is_rejected() {
    let toml = r#"
[sources]
mirrors = ["gitee"]
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject unknown mirror");
    assert!(!errors.is_empty());
}

/// Wrong value type produces an InvalidType diagnostic.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[fetch]
concurrency = "many"
"#;
    let errors = load_and_validate_str(toml).expect_err("should reject string concurrency");
    assert!(
        matches!(&errors[0], ConfigError::InvalidType { key, .. } if key.contains("concurrency")),
        "got: {:?}",
        errors[0]
    );
}

/// Semantic validation runs after deserialization.
#[test]
fn zero_concurrency_fails_validation() {
    let errors = load_and_validate_str("[fetch]\nconcurrency = 0\n").unwrap_err();
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}

/// An explicit config path is honored.
#[test]
fn explicit_path_is_loaded() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[output]\nfile_name = \"explicit.json\"").unwrap();

    let config = load_and_validate(Some(file.path())).expect("explicit file should load");
    assert_eq!(config.output.file_name, "explicit.json");
}
