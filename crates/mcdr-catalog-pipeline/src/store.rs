// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON file store for `plugins.json`.
//!
//! Commits write a temporary file next to the target and rename it over the
//! old catalog, so readers see either the previous or the new file.

use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mcdr_catalog_core::{CatalogError, CatalogRecord, CatalogStore};
use tracing::{debug, info};

/// Catalog persisted as a pretty-printed UTF-8 JSON array.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn store_error(&self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> CatalogError {
        CatalogError::Store {
            path: self.path.clone(),
            source: source.into(),
        }
    }
}

#[async_trait]
impl CatalogStore for JsonFileStore {
    async fn load(&self) -> Result<Vec<CatalogRecord>, CatalogError> {
        let body = match tokio::fs::read_to_string(&self.path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no prior catalog, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.store_error(e)),
        };
        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let records: Vec<CatalogRecord> =
            serde_json::from_str(&body).map_err(|e| self.store_error(e))?;
        debug!(path = %self.path.display(), records = records.len(), "prior catalog loaded");
        Ok(records)
    }

    async fn commit(&self, records: &[CatalogRecord]) -> Result<(), CatalogError> {
        let mut body = serde_json::to_vec_pretty(records).map_err(|e| self.store_error(e))?;
        body.push(b'\n');

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &body))
            .await
            .map_err(|e| CatalogError::Internal(format!("store writer panicked: {e}")))?
            .map_err(|e| self.store_error(e))
    }
}

fn write_atomically(path: &Path, body: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(body)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}
