// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory plugin index for deterministic testing.
//!
//! `MockIndex` implements `PluginIndex` over a fixed map of descriptors,
//! with switches for a failing listing and unreadable descriptors.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mcdr_catalog_core::{CatalogError, PluginDescriptor, PluginIndex};

/// A plugin index backed by JSON descriptors held in memory.
///
/// Slugs are listed in lexicographic order.
pub struct MockIndex {
    descriptors: BTreeMap<String, serde_json::Value>,
    unreadable: Arc<Mutex<HashSet<String>>>,
    listing_fails: bool,
}

impl MockIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self {
            descriptors: BTreeMap::new(),
            unreadable: Arc::new(Mutex::new(HashSet::new())),
            listing_fails: false,
        }
    }

    /// Add a plugin folder with the given descriptor.
    pub fn with_plugin(mut self, slug: &str, descriptor: serde_json::Value) -> Self {
        self.descriptors.insert(slug.to_string(), descriptor);
        self
    }

    /// Make `list()` fail as an unreachable index does.
    pub fn with_failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    /// Make the descriptor of `slug` fail with a transient error.
    pub async fn break_descriptor(&self, slug: &str) {
        self.unreadable.lock().await.insert(slug.to_string());
    }
}

impl Default for MockIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginIndex for MockIndex {
    fn name(&self) -> &str {
        "mock-index"
    }

    async fn list(&self) -> Result<Vec<String>, CatalogError> {
        if self.listing_fails {
            return Err(CatalogError::FatalConfig(
                "catalogue listing unavailable: mock".to_string(),
            ));
        }
        Ok(self.descriptors.keys().cloned().collect())
    }

    async fn descriptor(&self, slug: &str) -> Result<PluginDescriptor, CatalogError> {
        if self.unreadable.lock().await.contains(slug) {
            return Err(CatalogError::TransientFetch {
                url: format!("mock://{slug}"),
                attempts: 1,
                message: "mock descriptor failure".to_string(),
            });
        }
        let value = self.descriptors.get(slug).cloned().ok_or(CatalogError::Status {
            url: format!("mock://{slug}"),
            status: 404,
        })?;
        serde_json::from_value(value).map_err(|e| CatalogError::parse(format!("descriptor of {slug}"), e))
    }
}
