// SPDX-FileCopyrightText: 2026 MCDR Catalog Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin index abstraction.

use async_trait::async_trait;

use crate::error::CatalogError;
use crate::types::PluginDescriptor;

/// An enumerable plugin index: the remote catalogue repository or a local
/// checkout of it. Implementations are interchangeable.
#[async_trait]
pub trait PluginIndex: Send + Sync + 'static {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Lists every plugin folder slug.
    ///
    /// Failure here is fatal for the run; no per-plugin work starts.
    async fn list(&self) -> Result<Vec<String>, CatalogError>;

    /// Reads the descriptor for one slug.
    async fn descriptor(&self, slug: &str) -> Result<PluginDescriptor, CatalogError>;
}
